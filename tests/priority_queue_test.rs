use queued_consumer::queue::priority::PriorityQueue;
use queued_consumer::queue::WorkQueue;
use queued_consumer::{handler_fn, ConsumerBuilder};
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use tokio::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Job {
    priority: u8,
    name: &'static str,
}

impl Job {
    fn new(priority: u8, name: &'static str) -> Self {
        Self { priority, name }
    }
}

impl PartialOrd for Job {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Only the priority matters, names of equal priority keep arrival order
impl Ord for Job {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority.cmp(&other.priority)
    }
}

#[tokio::test]
async fn test_highest_priority_first() {
    let queue = PriorityQueue::new();
    queue.enqueue(Job::new(1, "low")).await.unwrap();
    queue.enqueue(Job::new(3, "critical")).await.unwrap();
    queue.enqueue(Job::new(2, "high")).await.unwrap();

    assert_eq!(queue.fetch().await.unwrap().name, "critical");
    assert_eq!(queue.fetch().await.unwrap().name, "high");
    assert_eq!(queue.try_fetch().await.unwrap().name, "low");
    assert_eq!(queue.try_fetch().await, None);
}

#[tokio::test]
async fn test_fifo_within_same_priority() {
    let queue = PriorityQueue::new();
    for name in ["a", "b", "c", "d"] {
        queue.enqueue(Job::new(1, name)).await.unwrap();
    }
    queue.enqueue(Job::new(2, "urgent")).await.unwrap();

    let mut order = vec![];
    while let Some(job) = queue.try_fetch().await {
        order.push(job.name);
    }
    assert_eq!(order, vec!["urgent", "a", "b", "c", "d"]);
}

#[tokio::test]
async fn test_close_rejects_enqueue() {
    let queue = PriorityQueue::new();
    queue.enqueue(Job::new(1, "kept")).await.unwrap();
    queue.close();

    assert!(queue.is_closed());
    assert!(queue.enqueue(Job::new(1, "rejected")).await.is_err());
    assert_eq!(queue.fetch().await.unwrap().name, "kept");
    assert_eq!(queue.fetch().await, None);
}

#[tokio::test]
async fn test_consumer_over_priority_queue() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let order_clone = Arc::clone(&order);

    let consumer = ConsumerBuilder::new(
        "prioritized",
        handler_fn(move |job: &Job| {
            order_clone.lock().unwrap().push(job.name);
            Ok(())
        }),
    )
    .with_queue(PriorityQueue::new)
    .build();

    // The worker first runs once this task yields, by then everything is queued
    consumer.start().unwrap();
    consumer.submit(Job::new(1, "low")).await.unwrap();
    consumer.submit(Job::new(5, "top")).await.unwrap();
    consumer.submit(Job::new(3, "mid")).await.unwrap();

    let signal = consumer.terminate().unwrap();
    assert_eq!(signal.wait_timeout(Duration::from_secs(5)).await, Ok(3));
    assert_eq!(*order.lock().unwrap(), vec!["top", "mid", "low"]);
}
