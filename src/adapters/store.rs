use crate::adapters::csv_store::CsvTableStore;
use crate::adapters::memory_store::MemoryTableStore;
use crate::adapters::remote_store::RemoteTableStore;
use crate::domain::model::OutputRow;
use crate::domain::ports::{ConfigProvider, StoreSettings, TableStore};
use crate::utils::error::Result;
use async_trait::async_trait;

/// The backend picked by configuration.
#[derive(Debug, Clone)]
pub enum AnyTableStore {
    Csv(CsvTableStore),
    Remote(RemoteTableStore),
    Memory(MemoryTableStore),
}

impl AnyTableStore {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        Self::from_settings(&config.store(), config.table_name())
    }

    /// `table` only matters for the memory backend, which creates it up front.
    pub fn from_settings(settings: &StoreSettings, table: &str) -> Result<Self> {
        let store = match settings {
            StoreSettings::Csv { directory } => {
                tracing::info!("Using CSV table store in {}", directory);
                AnyTableStore::Csv(CsvTableStore::new(directory))
            }
            StoreSettings::Remote {
                endpoint,
                token,
                timeout,
            } => {
                tracing::info!("Using remote table store at {}", endpoint);
                AnyTableStore::Remote(RemoteTableStore::new(endpoint, token.clone(), *timeout)?)
            }
            StoreSettings::Memory { header } => {
                tracing::warn!("Using in-memory table store, rows are lost on exit");
                AnyTableStore::Memory(MemoryTableStore::with_table(table, header))
            }
        };
        Ok(store)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AnyTableStore::Csv(_) => "csv",
            AnyTableStore::Remote(_) => "remote",
            AnyTableStore::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl TableStore for AnyTableStore {
    async fn read_header_cells(&self, table: &str) -> Result<Vec<String>> {
        match self {
            AnyTableStore::Csv(store) => store.read_header_cells(table).await,
            AnyTableStore::Remote(store) => store.read_header_cells(table).await,
            AnyTableStore::Memory(store) => store.read_header_cells(table).await,
        }
    }

    async fn append_row(&self, table: &str, row: &OutputRow) -> Result<()> {
        match self {
            AnyTableStore::Csv(store) => store.append_row(table, row).await,
            AnyTableStore::Remote(store) => store.append_row(table, row).await,
            AnyTableStore::Memory(store) => store.append_row(table, row).await,
        }
    }
}
