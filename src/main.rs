use clap::Parser;
use row_ingest::adapters::http;
use row_ingest::core::ConfigProvider;
use row_ingest::utils::error::ErrorSeverity;
use row_ingest::utils::{logger, validation::Validate};
use row_ingest::{AnyTableStore, CliConfig, IngestError, LockRegistry, RowIngestionHandler};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            std::process::exit(exit_code(&e));
        }
    };

    if config.log_json() {
        logger::init_json_logger(config.verbose());
    } else {
        logger::init_cli_logger(config.verbose());
    }

    tracing::info!("Starting row-ingest");
    tracing::debug!("Resolved config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(exit_code(&e));
    }

    let store = match AnyTableStore::from_config(&config) {
        Ok(store) => store,
        Err(e) => {
            if e.is_config_error() {
                eprintln!("❌ Invalid store configuration: {}", e);
            }
            tracing::error!("❌ Failed to set up table store: {}", e);
            std::process::exit(exit_code(&e));
        }
    };

    let locks = LockRegistry::new();
    let handler = Arc::new(RowIngestionHandler::from_config(store, &config, &locks));
    tracing::info!(
        "Appending to table '{}' via {} store (lock wait {:?}, strict: {})",
        config.table_name(),
        handler.store().kind(),
        config.lock_wait(),
        config.strict_lock()
    );

    if let Err(e) = http::serve(handler, config.bind_addr(), config.route_path()).await {
        tracing::error!("❌ Server stopped with error: {} ({:?})", e, e.severity());
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

fn exit_code(e: &IngestError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    }
}
