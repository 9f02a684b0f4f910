use crate::domain::model::OutputRow;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// An append-only tabular store addressed by table name.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Raw cells of row 1, left to right. Fails with `TableNotFound` when
    /// no table has this name.
    async fn read_header_cells(&self, table: &str) -> Result<Vec<String>>;

    /// Adds `row` after the last row of the table.
    async fn append_row(&self, table: &str, row: &OutputRow) -> Result<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSettings {
    Csv {
        directory: String,
    },
    Remote {
        endpoint: String,
        token: Option<String>,
        timeout: Duration,
    },
    /// In-process table created at startup with `header` as row 1.
    Memory {
        header: Vec<String>,
    },
}

pub trait ConfigProvider: Send + Sync {
    fn table_name(&self) -> &str;
    fn lock_wait(&self) -> Duration;
    fn strict_lock(&self) -> bool;
    fn store(&self) -> StoreSettings;
}
