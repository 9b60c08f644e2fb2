//! elaster - MongoDB to Elasticsearch re-indexer
//!
//! Reads the configured collections from MongoDB and rebuilds one
//! Elasticsearch index per collection.
//!
//! # Usage
//!
//! ```bash
//! # Export every configured collection
//! elaster -c elaster.toml
//!
//! # Export a subset with debug logging
//! elaster -c elaster.toml --only users --only orders -v
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use elaster::cli::CliInterface;
use elaster::error::Result;
use elaster::{BarReporter, ElasticClient, LogReporter, MongoSource, Orchestrator, ProgressReporter};

/// Application entry point
#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments and load configuration
/// 2. Initialize logging
/// 3. Handle subcommands or run the export
///
/// # Returns
/// * `Result<i32>` - Process exit code or error
async fn run() -> Result<i32> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    if cli.handle_subcommand().await? {
        return Ok(0);
    }

    cli.print_banner();
    run_export(&cli).await
}

/// Connect both endpoints and export every selected collection
async fn run_export(cli: &CliInterface) -> Result<i32> {
    let config = cli.config();

    // Destination first: a bad host must fail before the MongoDB client exists
    let index = ElasticClient::new(&config.elastic.host, config.request_timeout())?;
    let source = MongoSource::connect(&config.mongo).await?;
    debug!("Connected to database [{}]", source.database_name());

    let reporter: Arc<dyn ProgressReporter> = if cli.progress_bar_enabled() {
        Arc::new(BarReporter::new(config.progress.color))
    } else {
        Arc::new(LogReporter::new())
    };

    let cancel_token = CancellationToken::new();
    let ctrl_c_handle = spawn_ctrl_c_listener(cancel_token.clone());

    let report = Orchestrator::new(
        Box::new(source),
        Box::new(index),
        reporter,
        config.ping_timeout(),
    )
    .with_cancellation(cancel_token)
    .run(&config.collections)
    .await;

    ctrl_c_handle.abort();
    Ok(report.exit_code())
}

/// Cancel `token` on Ctrl+C
fn spawn_ctrl_c_listener(token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted, stopping after the current document");
                token.cancel();
            }
            Err(err) => {
                eprintln!("Failed to listen for Ctrl+C: {}", err);
            }
        }
    })
}

/// Initialize logging system based on verbosity level
///
/// `RUST_LOG`, when set, replaces the configured level.
///
/// # Arguments
/// * `cli` - CLI interface with the effective logging settings
fn initialize_logging(cli: &CliInterface) {
    let logging = &cli.config().logging;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.to_tracing_level().as_str()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
