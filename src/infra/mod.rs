pub mod csv_source;
pub mod factory;
pub mod file_publisher;
pub mod http_publisher;
pub mod log_publisher;
pub mod memory_source;
pub mod memory_writer;
pub mod sqlite_writer;
pub mod synthetic_source;
