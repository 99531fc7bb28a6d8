use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::ports::ProductPublisher;
use crate::domain::ProductCreated;
use crate::error::Result;

/// Writes each event into the log stream instead of a broker
pub struct LogProductPublisher {
    topic: String,
}

impl LogProductPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self { topic: topic.into() }
    }
}

#[async_trait]
impl ProductPublisher for LogProductPublisher {
    async fn publish(&self, _cancel: &CancellationToken, event: &ProductCreated) -> Result<()> {
        let payload = serde_json::to_string(event)?;
        info!(topic = %self.topic, %payload, "product created");
        Ok(())
    }
}
