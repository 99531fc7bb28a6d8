use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn, Instrument};

use crate::app::ports::{CatalogWriter, ProductStream};
use crate::app::validator::Validator;
use crate::constants::DEFAULT_CHANNEL_CAPACITY;
use crate::domain::Product;
use crate::error::{ImporterError, Result};

/// Counts collected by the store stage once every dispatched task has finished.
#[derive(Debug, Default)]
pub struct StoreSummary {
    pub received: usize,
    pub rejected: usize,
    pub stored: usize,
    pub failed: usize,
    /// Fatal read error that ended the input early, if any
    pub source_error: Option<ImporterError>,
}

impl StoreSummary {
    pub fn dispatched(&self) -> usize {
        self.stored + self.failed
    }

    fn record(&mut self, outcome: std::result::Result<StoreOutcome, JoinError>) {
        match outcome {
            Ok(StoreOutcome::Stored) => self.stored += 1,
            Ok(StoreOutcome::Failed) => self.failed += 1,
            Err(e) => {
                error!("store task aborted: {}", e);
                self.failed += 1;
            }
        }
    }
}

enum StoreOutcome {
    Stored,
    Failed,
}

/// Output side of the store stage: products in completion order, closed once
/// all store tasks are done.
pub struct StoreStream {
    records: mpsc::Receiver<Product>,
    summary: JoinHandle<StoreSummary>,
}

impl StoreStream {
    pub async fn recv(&mut self) -> Option<Product> {
        self.records.recv().await
    }

    /// Waits for the dispatcher. Call after draining, or the stage may block on
    /// a full output channel until this receiver is dropped.
    pub async fn finish(self) -> Result<StoreSummary> {
        drop(self.records);
        self.summary.await.map_err(|e| ImporterError::Storage {
            message: format!("store dispatcher failed: {}", e),
        })
    }
}

/// Validates incoming products and stores each valid one on its own task.
pub struct CatalogImportService {
    writer: Arc<dyn CatalogWriter>,
    validator: Arc<dyn Validator>,
    max_in_flight: Option<usize>,
    output_capacity: usize,
}

impl CatalogImportService {
    pub fn new(writer: Arc<dyn CatalogWriter>, validator: Arc<dyn Validator>) -> Self {
        Self {
            writer,
            validator,
            max_in_flight: None,
            output_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Caps concurrent inserts. `None` keeps the fan-out unbounded.
    pub fn with_max_in_flight(mut self, limit: Option<usize>) -> Self {
        self.max_in_flight = limit.map(|n| n.max(1));
        self
    }

    pub fn with_output_capacity(mut self, capacity: usize) -> Self {
        self.output_capacity = capacity.max(1);
        self
    }

    pub fn store(&self, cancel: &CancellationToken, mut products: ProductStream) -> StoreStream {
        let (tx, records) = mpsc::channel(self.output_capacity);
        let writer = Arc::clone(&self.writer);
        let validator = Arc::clone(&self.validator);
        let limiter = self.max_in_flight.map(|n| Arc::new(Semaphore::new(n)));
        let cancel = cancel.clone();

        let dispatcher = async move {
            let mut tasks: JoinSet<StoreOutcome> = JoinSet::new();
            let mut summary = StoreSummary::default();

            while let Some(item) = products.next().await {
                let product = match item {
                    Ok(product) => product,
                    Err(e) => {
                        error!("product source failed mid-stream: {}", e);
                        summary.source_error = Some(e);
                        break;
                    }
                };
                summary.received += 1;
                crate::metrics::import::product_received();

                if let Err(reason) = validator.validate(&product) {
                    warn!(product_id = %product.id, "dropping invalid product: {}", reason);
                    summary.rejected += 1;
                    crate::metrics::import::product_rejected();
                    continue;
                }

                let permit = match &limiter {
                    Some(sem) => Arc::clone(sem).acquire_owned().await.ok(),
                    None => None,
                };
                let writer = Arc::clone(&writer);
                let tx = tx.clone();
                let cancel = cancel.clone();

                tasks.spawn(
                    async move {
                        let _permit = permit;
                        let id = product.id;
                        let started = Instant::now();
                        let result = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(ImporterError::Cancelled),
                            res = writer.insert(&cancel, &product) => res,
                        };
                        match result {
                            Ok(()) => {
                                crate::metrics::import::product_stored(started.elapsed().as_secs_f64());
                                debug!(product_id = %id, "product stored");
                                if tx.send(product).await.is_err() {
                                    debug!(product_id = %id, "output closed before product was emitted");
                                }
                                StoreOutcome::Stored
                            }
                            Err(e) => {
                                error!(product_id = %id, "error while storing product: {}", e);
                                crate::metrics::import::product_store_failed();
                                StoreOutcome::Failed
                            }
                        }
                    }
                    .in_current_span(),
                );

                while let Some(done) = tasks.try_join_next() {
                    summary.record(done);
                }
            }

            while let Some(done) = tasks.join_next().await {
                summary.record(done);
            }
            // Last sender: the output closes only after every task has finished
            drop(tx);
            debug!(
                received = summary.received,
                rejected = summary.rejected,
                stored = summary.stored,
                failed = summary.failed,
                "store stage finished"
            );
            summary
        };

        StoreStream {
            records,
            summary: tokio::spawn(dispatcher.in_current_span()),
        }
    }
}
