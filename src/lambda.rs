#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use row_ingest::adapters::lambda_event::{handle_event, ProxyRequest, ProxyResponse};
#[cfg(feature = "lambda")]
use row_ingest::core::ConfigProvider;
#[cfg(feature = "lambda")]
use row_ingest::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use row_ingest::{AnyTableStore, LambdaConfig, LockRegistry, RowIngestionHandler};
#[cfg(feature = "lambda")]
use std::sync::Arc;

#[cfg(feature = "lambda")]
type Handler = RowIngestionHandler<AnyTableStore>;

#[cfg(feature = "lambda")]
async fn function_handler(
    handler: &Handler,
    event: LambdaEvent<Option<ProxyRequest>>,
) -> Result<Option<ProxyResponse>, Error> {
    tracing::debug!(request_id = %event.context.request_id, "Handling invocation");
    Ok(handle_event(handler, event.payload).await)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_json_logger(false);

    let config = LambdaConfig::from_env()?;
    config.validate()?;

    let store = AnyTableStore::from_config(&config)?;
    let handler = Arc::new(RowIngestionHandler::from_config(
        store,
        &config,
        &LockRegistry::new(),
    ));
    tracing::info!("Lambda ready, appending to table '{}'", config.table_name());

    run(service_fn(move |event| {
        let handler = Arc::clone(&handler);
        async move { function_handler(&handler, event).await }
    }))
    .await
}
