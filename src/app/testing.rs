//! Shared doubles for the use-case tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::app::ports::{CatalogWriter, ProductPublisher, ProductSource, ProductStream};
use crate::domain::{Product, ProductCreated, ProductId};
use crate::error::{ImporterError, Result};

pub fn products(ids: &[i64]) -> Vec<Product> {
    ids.iter()
        .map(|id| Product::new(*id, format!("Product {}", id), "Brand", "Description", 100.0))
        .collect()
}

pub fn source_of(products: Vec<Product>) -> ProductStream {
    let (tx, stream) = ProductStream::channel(products.len().max(1));
    for product in products {
        tx.try_send(Ok(product)).expect("channel sized for all products");
    }
    stream
}

/// Yields the given products, then a read error, like a file truncated mid-run.
pub struct BrokenSource {
    ids: Vec<i64>,
}

impl BrokenSource {
    pub fn after(ids: &[i64]) -> Self {
        Self { ids: ids.to_vec() }
    }
}

#[async_trait]
impl ProductSource for BrokenSource {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn provide(&self, _cancel: &CancellationToken) -> Result<ProductStream> {
        let (tx, stream) = ProductStream::channel(self.ids.len() + 1);
        for product in products(&self.ids) {
            tx.try_send(Ok(product)).expect("channel sized for all items");
        }
        tx.try_send(Err(ImporterError::Io(std::io::Error::other("connection reset"))))
            .expect("channel sized for all items");
        Ok(stream)
    }
}

type DelayFn = Box<dyn Fn(ProductId) -> Duration + Send + Sync>;

pub struct RecordingWriter {
    fail_ids: HashSet<ProductId>,
    delay: Option<DelayFn>,
    inserted: Mutex<Vec<ProductId>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self {
            fail_ids: HashSet::new(),
            delay: None,
            inserted: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn failing_for(mut self, ids: &[i64]) -> Self {
        self.fail_ids = ids.iter().map(|id| ProductId(*id)).collect();
        self
    }

    pub fn with_delay(mut self, delay: impl Fn(ProductId) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.inserted.lock().unwrap().len()
    }

    pub fn inserted_ids(&self) -> HashSet<ProductId> {
        self.inserted.lock().unwrap().iter().copied().collect()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogWriter for RecordingWriter {
    async fn insert(&self, _cancel: &CancellationToken, product: &Product) -> Result<()> {
        self.inserted.lock().unwrap().push(product.id);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(product.id)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_ids.contains(&product.id) {
            return Err(ImporterError::Storage {
                message: format!("insert rejected for {}", product.id),
            });
        }
        Ok(())
    }
}

pub struct RecordingPublisher {
    fail_ids: HashSet<i64>,
    published: Mutex<Vec<i64>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            fail_ids: HashSet::new(),
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, ids: &[i64]) -> Self {
        self.fail_ids = ids.iter().copied().collect();
        self
    }

    pub fn calls(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn published_ids(&self) -> HashSet<i64> {
        self.published.lock().unwrap().iter().copied().collect()
    }
}

#[async_trait]
impl ProductPublisher for RecordingPublisher {
    async fn publish(&self, _cancel: &CancellationToken, event: &ProductCreated) -> Result<()> {
        self.published.lock().unwrap().push(event.id);
        if self.fail_ids.contains(&event.id) {
            return Err(ImporterError::Publish {
                message: format!("broker refused {}", event.id),
            });
        }
        Ok(())
    }
}
