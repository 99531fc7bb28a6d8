use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::app::import_service::StoreStream;
use crate::app::ports::ProductPublisher;
use crate::domain::{ProductCreated, ProductId};
use crate::error::ImporterError;

#[derive(Debug)]
pub struct PublishFailure {
    pub product_id: ProductId,
    pub error: ImporterError,
}

/// Every publish failure of a run, in the order they happened.
#[derive(Debug)]
pub struct PublishFailures(pub Vec<PublishFailure>);

impl PublishFailures {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.0.iter().map(|f| f.product_id).collect()
    }
}

impl fmt::Display for PublishFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} product(s) failed to publish", self.0.len())?;
        for (i, failure) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} ({})", sep, failure.product_id, failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PublishFailures {}

#[derive(Debug, Default)]
pub struct PublishOutcome {
    pub published: usize,
    pub failures: Vec<PublishFailure>,
}

impl PublishOutcome {
    pub fn into_result(self) -> Result<usize, PublishFailures> {
        if self.failures.is_empty() {
            Ok(self.published)
        } else {
            Err(PublishFailures(self.failures))
        }
    }
}

/// Publishes one event per stored product, sequentially, never stopping early.
pub struct PublishConsumer {
    publisher: Arc<dyn ProductPublisher>,
}

impl PublishConsumer {
    pub fn new(publisher: Arc<dyn ProductPublisher>) -> Self {
        Self { publisher }
    }

    pub async fn drain(&self, cancel: &CancellationToken, records: &mut StoreStream) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();
        while let Some(product) = records.recv().await {
            let event = ProductCreated::from(&product);
            match self.publisher.publish(cancel, &event).await {
                Ok(()) => {
                    debug!(product_id = %product.id, "product created event published");
                    crate::metrics::import::event_published();
                    outcome.published += 1;
                }
                Err(e) => {
                    error!(product_id = %product.id, "can't publish product created event: {}", e);
                    crate::metrics::import::event_publish_failed();
                    outcome.failures.push(PublishFailure {
                        product_id: product.id,
                        error: e,
                    });
                }
            }
        }
        outcome
    }
}
