/// Defaults shared by the configuration layer and the CLI

pub const DEFAULT_CONFIG_PATH: &str = "catalog-importer.toml";

// Event transport
pub const PRODUCT_CREATED_TOPIC: &str = "PRODUCTS.created";
pub const DEFAULT_EVENTS_PATH: &str = "output/product_created.ndjson";
pub const DEFAULT_PUBLISH_TIMEOUT_SECS: u64 = 10;

// Storage
pub const DEFAULT_DATABASE_PATH: &str = "data/catalog.db";

// Streaming
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;
pub const DEFAULT_SYNTHETIC_COUNT: usize = 100;

// Logging
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "catalog-importer.log";
pub const DEFAULT_LOG_FILTER: &str = "catalog_importer=info,info";

// Environment overrides
pub const ENV_SOURCE_PATH: &str = "CATALOG_SOURCE_PATH";
pub const ENV_DATABASE_PATH: &str = "CATALOG_DATABASE_PATH";
pub const ENV_PUBLISHER_URL: &str = "CATALOG_PUBLISHER_URL";
pub const ENV_METRICS_PORT: &str = "CATALOG_METRICS_PORT";
