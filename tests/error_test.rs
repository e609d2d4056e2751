use queued_consumer::{ConsumerError, State, TaskError};
use std::time::Duration;

#[test]
fn test_error_types() {
    let err = ConsumerError::QueueFull(3);
    assert_eq!(err.to_string(), "Queue is full (capacity 3)");

    let err = ConsumerError::Lifecycle {
        name: "worker".to_string(),
        operation: "terminate",
        state: State::Terminated,
    };
    assert_eq!(
        err.to_string(),
        "cannot terminate consumer 'worker' while TERMINATED"
    );

    let err = TaskError::Timeout(Duration::from_millis(250));
    assert_eq!(err.to_string(), "task timed out after 250ms");
}
