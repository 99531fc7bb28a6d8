use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use catalog_importer::app::import_service::CatalogImportService;
use catalog_importer::app::import_use_case::{ImportProductsUseCase, ImportReport};
use catalog_importer::app::validator::ProductValidator;
use catalog_importer::config::{Config, PublisherKind, SourceKind, WriterKind};
use catalog_importer::constants::{DEFAULT_CONFIG_PATH, DEFAULT_SYNTHETIC_COUNT};
use catalog_importer::infra::csv_source::write_products_csv;
use catalog_importer::infra::factory::{build_publisher, build_source, build_writer};
use catalog_importer::infra::synthetic_source::generate_products;
use catalog_importer::{logging, metrics};

#[derive(Parser)]
#[command(name = "catalog_importer")]
#[command(about = "Imports catalog products and publishes a created event per stored product")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file (optional)
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import all products
    RunImport(RunImportArgs),
    /// Write a synthetic product CSV that run-import can consume
    Seed {
        /// Destination CSV file
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = DEFAULT_SYNTHETIC_COUNT)]
        count: usize,
        /// Fixed RNG seed for reproducible files
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Args)]
struct RunImportArgs {
    #[arg(long, value_enum)]
    source: Option<SourceKind>,
    /// CSV file to import (implies --source csv)
    #[arg(long)]
    path: Option<PathBuf>,
    /// Treat the first CSV row as a header
    #[arg(long)]
    headers: bool,
    /// Number of products for the synthetic source
    #[arg(long)]
    count: Option<usize>,
    #[arg(long, value_enum)]
    writer: Option<WriterKind>,
    #[arg(long)]
    database: Option<PathBuf>,
    /// Cap on concurrent inserts (unbounded when omitted)
    #[arg(long)]
    max_in_flight: Option<usize>,
    /// Reject products with an empty name
    #[arg(long)]
    require_name: bool,
    #[arg(long, value_enum)]
    publisher: Option<PublisherKind>,
    /// NDJSON output for the file publisher
    #[arg(long)]
    output: Option<PathBuf>,
    /// Base URL for the http publisher
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    metrics_port: Option<u16>,
}

impl RunImportArgs {
    fn apply(self, config: &mut Config) {
        if let Some(path) = self.path {
            config.source.path = Some(path);
            config.source.kind = SourceKind::Csv;
        }
        if let Some(kind) = self.source {
            config.source.kind = kind;
        }
        if self.headers {
            config.source.has_headers = true;
        }
        if let Some(count) = self.count {
            config.source.synthetic_count = count;
        }
        if let Some(kind) = self.writer {
            config.store.kind = kind;
        }
        if let Some(db) = self.database {
            config.store.database_path = db;
        }
        if self.max_in_flight.is_some() {
            config.store.max_in_flight = self.max_in_flight;
        }
        if self.require_name {
            config.validation.require_name = true;
        }
        if let Some(kind) = self.publisher {
            config.publisher.kind = kind;
        }
        if let Some(output) = self.output {
            config.publisher.output_path = output;
        }
        if self.url.is_some() {
            config.publisher.url = self.url;
        }
        if let Some(topic) = self.topic {
            config.publisher.topic = topic;
        }
        if self.metrics_port.is_some() {
            config.metrics.port = self.metrics_port;
        }
    }
}

async fn run_import(config: Config) -> anyhow::Result<ImportReport> {
    config.validate()?;
    if let Some(port) = config.metrics.port {
        metrics::init_metrics(port);
    }

    let source = build_source(&config.source).context("can't create product source")?;
    let writer = build_writer(&config.store).context("can't create catalog writer")?;
    let publisher = build_publisher(&config.publisher).context("can't create publisher")?;

    let validator = ProductValidator::new().require_name(config.validation.require_name);
    let service = CatalogImportService::new(writer, Arc::new(validator))
        .with_max_in_flight(config.store.max_in_flight)
        .with_output_capacity(config.store.output_capacity);
    let import = ImportProductsUseCase::new(service, source, publisher);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling import");
            on_signal.cancel();
        }
    });

    let report = import.execute(&cancel).await?;
    Ok(report)
}

fn seed(output: PathBuf, count: usize, seed: Option<u64>) -> anyhow::Result<()> {
    let products = generate_products(count, seed);
    write_products_csv(&output, &products)
        .with_context(|| format!("can't write seed file {}", output.display()))?;
    info!("Wrote {} products to {}", products.len(), output.display());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("can't load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = config.apply_env() {
        eprintln!("invalid environment: {}", e);
        return ExitCode::FAILURE;
    }
    let _guard = logging::init_logging(&config.logging);

    let result = match cli.command {
        Commands::RunImport(args) => {
            args.apply(&mut config);
            run_import(config).await.map(|report| {
                info!(
                    run_id = %report.run_id,
                    stored = report.stored,
                    published = report.published,
                    "import finished cleanly"
                );
            })
        }
        Commands::Seed { output, count, seed: rng_seed } => seed(output, count, rng_seed),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_run_import() {
        let cli = Cli::try_parse_from([
            "catalog_importer",
            "run-import",
            "--path",
            "products.csv",
            "--writer",
            "memory",
            "--max-in-flight",
            "8",
        ])
        .unwrap();
        let Commands::RunImport(args) = cli.command else {
            panic!("expected run-import");
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.source.kind, SourceKind::Csv);
        assert_eq!(config.store.kind, WriterKind::Memory);
        assert_eq!(config.store.max_in_flight, Some(8));
    }

    #[test]
    fn seed_writes_requested_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        seed(path.clone(), 5, Some(3)).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 5);
    }
}
