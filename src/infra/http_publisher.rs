use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::ports::ProductPublisher;
use crate::domain::ProductCreated;
use crate::error::{ImporterError, Result};

/// Posts each event as JSON to `<base_url>/<topic>`. Any non-2xx response is a
/// failed publish; nothing is retried.
pub struct HttpProductPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProductPublisher {
    pub fn new(base_url: &str, topic: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/{}", base_url.trim_end_matches('/'), topic),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ProductPublisher for HttpProductPublisher {
    async fn publish(&self, cancel: &CancellationToken, event: &ProductCreated) -> Result<()> {
        let request = self.client.post(&self.endpoint).json(event).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ImporterError::Cancelled),
            res = request => res?,
        };
        let status = response.status();
        if !status.is_success() {
            return Err(ImporterError::Publish {
                message: format!("{} responded with status {}", self.endpoint, status.as_u16()),
            });
        }
        debug!("Published product {} to {}", event.id, self.endpoint);
        Ok(())
    }
}
