use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{Product, ProductCreated};
use crate::error::Result;

/// Lazy, finite, single-pass sequence of products produced by a source.
///
/// An `Err` item is a fatal read failure; the producer stops after sending it.
pub struct ProductStream {
    rx: mpsc::Receiver<Result<Product>>,
}

impl ProductStream {
    pub fn channel(capacity: usize) -> (mpsc::Sender<Result<Product>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self { rx })
    }

    pub async fn next(&mut self) -> Option<Result<Product>> {
        self.rx.recv().await
    }
}

#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Short label used in logs and metrics
    fn name(&self) -> &'static str;

    /// Opens the origin and starts producing. Failing to open is returned here,
    /// before any product flows.
    async fn provide(&self, cancel: &CancellationToken) -> Result<ProductStream>;
}

/// Persists one product. Implementations upsert by id and must tolerate
/// concurrent calls.
#[async_trait]
pub trait CatalogWriter: Send + Sync {
    async fn insert(&self, cancel: &CancellationToken, product: &Product) -> Result<()>;
}

#[async_trait]
pub trait ProductPublisher: Send + Sync {
    async fn publish(&self, cancel: &CancellationToken, event: &ProductCreated) -> Result<()>;
}
