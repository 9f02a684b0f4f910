pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{LambdaConfig, TomlConfig};

pub use adapters::{
    csv_store::CsvTableStore, memory_store::MemoryTableStore, remote_store::RemoteTableStore,
    store::AnyTableStore,
};
pub use crate::core::{handler::RowIngestionHandler, lock::LockRegistry};
pub use utils::error::{IngestError, Result};
