use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::app::ports::CatalogWriter;
use crate::domain::{Product, ProductId};
use crate::error::{ImporterError, Result};

/// In-memory catalog for development and dry runs
#[derive(Clone, Default)]
pub struct InMemoryCatalogWriter {
    products: Arc<Mutex<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.products.lock().ok()?.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.products.lock().map(|p| p.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CatalogWriter for InMemoryCatalogWriter {
    async fn insert(&self, _cancel: &CancellationToken, product: &Product) -> Result<()> {
        let mut products = self.products.lock().map_err(|_| ImporterError::Storage {
            message: "in-memory catalog lock poisoned".to_string(),
        })?;
        products.insert(product.id, product.clone());
        debug!("Upserted product {} in memory", product.id);
        Ok(())
    }
}
