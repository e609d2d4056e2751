//! Queued Consumer binary entry point

use queued_consumer::{handler_fn, Config, ConsumerBuilder, TaskError};
use serde_json::{json, Value};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Queued Consumer");

    let config = Config::load()?;
    config.validate()?;

    info!(
        "Initialized consumer '{}' with queue capacity {}",
        config.name, config.queue_capacity
    );

    let handler = handler_fn(|job: &Value| match job.get("id").and_then(Value::as_u64) {
        Some(id) => {
            info!("Processed job {}", id);
            Ok(())
        }
        None => Err(TaskError::failed(format!("job without id: {job}"))),
    });

    let consumer = ConsumerBuilder::from_config(&config, handler).build();
    consumer.start()?;

    for i in 0..10 {
        consumer.submit(json!({ "id": i })).await?;
    }
    consumer.submit(json!({ "name": "malformed" })).await?;

    let signal = consumer.terminate()?;
    let consumed = signal.wait_timeout(config.shutdown_timeout()).await?;

    info!("Consumer '{}' finished after {} tasks", consumer.name(), consumed);
    Ok(())
}
