use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::app::ports::{ProductSource, ProductStream};
use crate::constants::DEFAULT_CHANNEL_CAPACITY;
use crate::domain::Product;
use crate::error::Result;

/// Replays a fixed list of products; every `provide` starts a fresh stream.
pub struct InMemoryProductSource {
    products: Vec<Product>,
    capacity: usize,
}

impl InMemoryProductSource {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

#[async_trait]
impl ProductSource for InMemoryProductSource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn provide(&self, cancel: &CancellationToken) -> Result<ProductStream> {
        let (tx, stream) = ProductStream::channel(self.capacity);
        let products = self.products.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let total = products.len();
            for (position, product) in products.into_iter().enumerate() {
                if cancel.is_cancelled() {
                    warn!(position, total, "replay cancelled, remaining products not imported");
                    crate::metrics::import::source_cancelled("memory");
                    break;
                }
                if tx.send(Ok(product)).await.is_err() {
                    break;
                }
            }
        });
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::products;

    #[tokio::test]
    async fn replays_in_order() {
        let source = InMemoryProductSource::new(products(&[3, 1, 2]));
        let mut stream = source.provide(&CancellationToken::new()).await.unwrap();
        let mut ids = Vec::new();
        while let Some(item) = stream.next().await {
            ids.push(item.unwrap().id.value());
        }
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn cancelled_replay_yields_nothing() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut stream = InMemoryProductSource::new(products(&[1, 2, 3]))
            .provide(&cancel)
            .await
            .unwrap();
        assert!(stream.next().await.is_none());
    }
}
