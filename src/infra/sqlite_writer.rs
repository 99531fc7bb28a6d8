use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::app::ports::CatalogWriter;
use crate::domain::{Product, ProductId};
use crate::error::{ImporterError, Result};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id               INTEGER PRIMARY KEY,
        name             TEXT NOT NULL,
        brand            TEXT NOT NULL,
        description      TEXT NOT NULL,
        price            REAL NOT NULL,
        promotion_price  REAL
    );
"#;

const UPSERT: &str = "INSERT INTO products (id, name, brand, description, price, promotion_price)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT(id) DO UPDATE SET name=excluded.name, brand=excluded.brand,
        description=excluded.description, price=excluded.price,
        promotion_price=excluded.promotion_price";

/// SQLite-backed catalog. Inserts are upserts keyed by product id and run on
/// the blocking pool; `get_product` and `count` are synchronous helpers.
pub struct SqliteCatalogWriter {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCatalogWriter {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!(path = %db_path.display(), "Opened SQLite catalog");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        lock(&self.conn)
    }

    pub fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let conn = self.conn()?;
        let product = conn
            .query_row(
                "SELECT id, name, brand, description, price, promotion_price FROM products WHERE id = ?1",
                params![id.value()],
                |row| {
                    Ok(Product {
                        id: ProductId(row.get(0)?),
                        name: row.get(1)?,
                        brand: row.get(2)?,
                        description: row.get(3)?,
                        price: row.get(4)?,
                        promotion_price: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(product)
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self.conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| ImporterError::Storage {
        message: "sqlite connection lock poisoned".to_string(),
    })
}

fn upsert(conn: &Connection, product: &Product) -> Result<()> {
    conn.execute(
        UPSERT,
        params![
            product.id.value(),
            product.name,
            product.brand,
            product.description,
            product.price,
            product.promotion_price
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CatalogWriter for SqliteCatalogWriter {
    async fn insert(&self, cancel: &CancellationToken, product: &Product) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(ImporterError::Cancelled);
        }
        let conn = Arc::clone(&self.conn);
        let product = product.clone();
        let cancel = cancel.clone();
        let span = tracing::Span::current();

        tokio::task::spawn_blocking(move || {
            let _enter = span.enter();
            let guard = lock(&conn)?;
            // Queued behind other inserts while the run was cancelled
            if cancel.is_cancelled() {
                return Err(ImporterError::Cancelled);
            }
            upsert(&guard, &product)?;
            debug!("Upserted product {} in sqlite", product.id);
            Ok(())
        })
        .await
        .map_err(|e| ImporterError::Storage {
            message: format!("sqlite insert task failed: {}", e),
        })?
    }
}
