use std::sync::Arc;
use std::time::Duration;

use crate::app::ports::{CatalogWriter, ProductPublisher, ProductSource};
use crate::config::{PublisherConfig, PublisherKind, SourceConfig, SourceKind, StoreConfig, WriterKind};
use crate::error::{ImporterError, Result};
use crate::infra::csv_source::CsvProductSource;
use crate::infra::file_publisher::FileProductPublisher;
use crate::infra::http_publisher::HttpProductPublisher;
use crate::infra::log_publisher::LogProductPublisher;
use crate::infra::memory_writer::InMemoryCatalogWriter;
use crate::infra::sqlite_writer::SqliteCatalogWriter;
use crate::infra::synthetic_source::SyntheticProductSource;

pub fn build_source(config: &SourceConfig) -> Result<Arc<dyn ProductSource>> {
    match config.kind {
        SourceKind::Csv => {
            let path = config
                .path
                .clone()
                .ok_or_else(|| ImporterError::Config("csv source requires a path".to_string()))?;
            Ok(Arc::new(
                CsvProductSource::new(path)
                    .with_headers(config.has_headers)
                    .with_capacity(config.channel_capacity),
            ))
        }
        SourceKind::Synthetic => {
            let mut source = SyntheticProductSource::new(config.synthetic_count).with_capacity(config.channel_capacity);
            if let Some(seed) = config.seed {
                source = source.with_seed(seed);
            }
            Ok(Arc::new(source))
        }
    }
}

pub fn build_writer(config: &StoreConfig) -> Result<Arc<dyn CatalogWriter>> {
    match config.kind {
        WriterKind::Memory => Ok(Arc::new(InMemoryCatalogWriter::new())),
        WriterKind::Sqlite => Ok(Arc::new(SqliteCatalogWriter::open(&config.database_path)?)),
    }
}

pub fn build_publisher(config: &PublisherConfig) -> Result<Arc<dyn ProductPublisher>> {
    match config.kind {
        PublisherKind::Log => Ok(Arc::new(LogProductPublisher::new(config.topic.clone()))),
        PublisherKind::File => Ok(Arc::new(FileProductPublisher::new(&config.output_path)?)),
        PublisherKind::Http => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| ImporterError::Config("http publisher requires a url".to_string()))?;
            Ok(Arc::new(HttpProductPublisher::new(
                url,
                &config.topic,
                Duration::from_secs(config.timeout_seconds),
            )?))
        }
    }
}
