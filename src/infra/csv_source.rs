use std::fs::File;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::ports::{ProductSource, ProductStream};
use crate::constants::DEFAULT_CHANNEL_CAPACITY;
use crate::domain::Product;
use crate::error::{ImporterError, Result};

/// Reads products from a CSV file with rows
/// `id, brand, name, description, price[, promotion_price]`.
pub struct CsvProductSource {
    path: PathBuf,
    has_headers: bool,
    capacity: usize,
}

impl CsvProductSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            has_headers: false,
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

fn parse_row(row: &csv::StringRecord) -> std::result::Result<Product, String> {
    if row.len() != 5 && row.len() != 6 {
        return Err(format!("expected 5 or 6 columns, found {}", row.len()));
    }
    let id: i64 = row[0].parse().map_err(|e| format!("bad id '{}': {}", &row[0], e))?;
    let price: f64 = row[4].parse().map_err(|e| format!("bad price '{}': {}", &row[4], e))?;
    let promotion_price = match row.get(5).filter(|v| !v.is_empty()) {
        Some(v) => Some(v.parse::<f64>().map_err(|e| format!("bad promotion price '{}': {}", v, e))?),
        None => None,
    };
    Ok(Product {
        promotion_price,
        ..Product::new(id, &row[2], &row[1], &row[3], price)
    })
}

#[async_trait]
impl ProductSource for CsvProductSource {
    fn name(&self) -> &'static str {
        "csv"
    }

    async fn provide(&self, cancel: &CancellationToken) -> Result<ProductStream> {
        let file = File::open(&self.path).map_err(|source| ImporterError::SourceOpen {
            path: self.path.display().to_string(),
            source,
        })?;
        info!(path = %self.path.display(), "Successfully opened CSV file");

        let (tx, stream) = ProductStream::channel(self.capacity);
        let has_headers = self.has_headers;
        let cancel = cancel.clone();
        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(has_headers)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(file);

            let mut sent = 0usize;
            let mut rows = reader.records();
            while let Some(row) = rows.next() {
                if cancel.is_cancelled() {
                    let line = rows.reader().position().line();
                    warn!(line, products_sent = sent, "csv read cancelled, remaining rows not imported");
                    crate::metrics::import::source_cancelled("csv");
                    break;
                }
                let row = match row {
                    Ok(row) => row,
                    Err(e) if e.is_io_error() => {
                        let _ = tx.blocking_send(Err(e.into()));
                        break;
                    }
                    Err(e) => {
                        warn!("skipping unreadable csv row: {}", e);
                        crate::metrics::import::row_skipped();
                        continue;
                    }
                };
                match parse_row(&row) {
                    Ok(product) => {
                        if tx.blocking_send(Ok(product)).is_err() {
                            debug!("product stream closed by consumer");
                            break;
                        }
                        sent += 1;
                    }
                    Err(reason) => {
                        let line = row.position().map(|p| p.line()).unwrap_or_default();
                        warn!(line, "skipping malformed csv row: {}", reason);
                        crate::metrics::import::row_skipped();
                    }
                }
            }
        });

        Ok(stream)
    }
}

/// Writes products in the layout `CsvProductSource` reads, without a header row.
pub fn write_products_csv(path: &Path, products: &[Product]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for p in products {
        let mut row = vec![
            p.id.to_string(),
            p.brand.clone(),
            p.name.clone(),
            p.description.clone(),
            format!("{:.2}", p.price),
        ];
        if let Some(promo) = p.promotion_price {
            row.push(format!("{:.2}", promo));
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
