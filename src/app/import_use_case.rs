use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Instrument};
use uuid::Uuid;

use crate::app::import_service::CatalogImportService;
use crate::app::ports::{ProductPublisher, ProductSource};
use crate::app::publish_consumer::{PublishConsumer, PublishFailures};
use crate::error::ImporterError;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("product source failed: {0}")]
    Source(#[source] ImporterError),

    #[error("store stage failed: {0}")]
    Store(#[source] ImporterError),

    #[error(transparent)]
    Publish(#[from] PublishFailures),
}

/// Counters of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub received: usize,
    pub rejected: usize,
    pub stored: usize,
    pub store_failed: usize,
    pub published: usize,
    pub publish_failed: usize,
}

/// Source -> store stage -> publish consumer, one single-shot run per `execute`.
pub struct ImportProductsUseCase {
    service: CatalogImportService,
    source: Arc<dyn ProductSource>,
    consumer: PublishConsumer,
}

impl ImportProductsUseCase {
    pub fn new(
        service: CatalogImportService,
        source: Arc<dyn ProductSource>,
        publisher: Arc<dyn ProductPublisher>,
    ) -> Self {
        Self {
            service,
            source,
            consumer: PublishConsumer::new(publisher),
        }
    }

    pub async fn execute(&self, cancel: &CancellationToken) -> Result<ImportReport, ImportError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("import_run", %run_id, source = self.source.name());
        self.run(run_id, cancel).instrument(span).await
    }

    async fn run(&self, run_id: Uuid, cancel: &CancellationToken) -> Result<ImportReport, ImportError> {
        let started_at = Utc::now();
        let t0 = Instant::now();
        info!("Start import products");
        crate::metrics::import::run_started(self.source.name());

        let products = self.source.provide(cancel).await.map_err(|e| {
            error!("can't open product source: {}", e);
            crate::metrics::import::source_failed(self.source.name());
            ImportError::Source(e)
        })?;

        let mut stream = self.service.store(cancel, products);
        let outcome = self.consumer.drain(cancel, &mut stream).await;
        let mut summary = stream.finish().await.map_err(ImportError::Store)?;
        crate::metrics::import::run_duration(t0.elapsed().as_secs_f64());

        let report = ImportReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            received: summary.received,
            rejected: summary.rejected,
            stored: summary.stored,
            store_failed: summary.failed,
            published: outcome.published,
            publish_failed: outcome.failures.len(),
        };
        info!(
            received = report.received,
            rejected = report.rejected,
            stored = report.stored,
            store_failed = report.store_failed,
            published = report.published,
            publish_failed = report.publish_failed,
            "Finish import products"
        );

        if let Some(e) = summary.source_error.take() {
            crate::metrics::import::source_failed(self.source.name());
            if !outcome.failures.is_empty() {
                warn!("{} publish failure(s) superseded by source failure", outcome.failures.len());
            }
            return Err(ImportError::Source(e));
        }
        outcome.into_result()?;
        Ok(report)
    }
}
