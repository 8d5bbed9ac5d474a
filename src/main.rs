use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use filenest::file::blob_store_from_config;
use filenest::{Config, Database, WebServer};

/// Config file used when `FILENEST_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::var("FILENEST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    // Load configuration
    let mut config = match Config::load(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = filenest::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        filenest::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    info!("filenest {}", env!("CARGO_PKG_VERSION"));

    let db = match Database::open_with_pool_size(
        &config.database.path,
        config.database.max_connections,
    )
    .await
    {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!(path = %config.database.path, "Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(path = %config.database.path, "Database ready");

    let blobs = match blob_store_from_config(&config.blob) {
        Ok(blobs) => blobs,
        Err(e) => {
            error!("Failed to initialize blob storage: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(backend = blobs.name(), "Blob storage ready");

    let server = match WebServer::from_config(&config, db.clone(), blobs) {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = server.run().await;
    db.close().await;

    match result {
        Ok(()) => {
            info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Web server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
