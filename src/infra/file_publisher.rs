use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::app::ports::ProductPublisher;
use crate::domain::ProductCreated;
use crate::error::{ImporterError, Result};

/// Appends events as NDJSON, one line per product
pub struct FileProductPublisher {
    writer: Mutex<BufWriter<std::fs::File>>,
    path: PathBuf,
}

impl FileProductPublisher {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        info!("Creating product event output file: {}", path.display());
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }
}

#[async_trait]
impl ProductPublisher for FileProductPublisher {
    async fn publish(&self, _cancel: &CancellationToken, event: &ProductCreated) -> Result<()> {
        let line = serde_json::to_string(event)?;
        let mut writer = self.writer.lock().map_err(|_| ImporterError::Publish {
            message: format!("event file {} lock poisoned", self.path.display()),
        })?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Product;

    #[tokio::test]
    async fn writes_one_json_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events/out.ndjson");
        let publisher = FileProductPublisher::new(&path).unwrap();
        let cancel = CancellationToken::new();
        for id in [1, 2] {
            let event = ProductCreated::from(&Product::new(id, "n", "b", "d", 1.0));
            publisher.publish(&cancel, &event).await.unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        let events: Vec<ProductCreated> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1, 2]);
    }
}
