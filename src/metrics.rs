//! Prometheus metrics for import runs.
//!
//! Recording is always on; the exporter is only installed when a port is
//! configured, so the macros are no-ops otherwise.

use std::net::SocketAddr;
use tracing::{info, warn};

pub fn init_metrics(port: u16) {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            info!("Prometheus exporter listening on http://{}/metrics", addr);
        }
        Err(e) => {
            warn!("Prometheus exporter install failed (possibly already installed): {}", e);
        }
    }
}

pub mod import {
    use ::metrics::{counter, histogram};

    pub fn run_started(source: &'static str) {
        counter!("catalog_import_runs_total", "source" => source).increment(1);
    }

    pub fn source_failed(source: &'static str) {
        counter!("catalog_import_source_failures_total", "source" => source).increment(1);
    }

    pub fn source_cancelled(source: &'static str) {
        counter!("catalog_import_source_cancellations_total", "source" => source).increment(1);
    }

    pub fn row_skipped() {
        counter!("catalog_import_rows_skipped_total").increment(1);
    }

    pub fn product_received() {
        counter!("catalog_import_products_received_total").increment(1);
    }

    pub fn product_rejected() {
        counter!("catalog_import_products_rejected_total").increment(1);
    }

    pub fn product_stored(secs: f64) {
        counter!("catalog_import_products_stored_total").increment(1);
        histogram!("catalog_import_store_duration_seconds").record(secs);
    }

    pub fn product_store_failed() {
        counter!("catalog_import_products_store_failed_total").increment(1);
    }

    pub fn event_published() {
        counter!("catalog_import_events_published_total").increment(1);
    }

    pub fn event_publish_failed() {
        counter!("catalog_import_events_publish_failed_total").increment(1);
    }

    pub fn run_duration(secs: f64) {
        histogram!("catalog_import_run_duration_seconds").record(secs);
    }
}
