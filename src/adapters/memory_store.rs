use crate::domain::model::OutputRow;
use crate::domain::ports::TableStore;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tables kept in process memory. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    tables: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out with one table whose only row is `header`.
    pub fn with_table<T: AsRef<str>>(name: &str, header: &[T]) -> Self {
        let header = header.iter().map(|h| h.as_ref().to_string()).collect();
        let tables = HashMap::from([(name.to_string(), vec![header])]);
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }

    /// Creates (or replaces) a table whose only row is `header`.
    pub async fn create_table<T: AsRef<str>>(&self, name: &str, header: &[T]) {
        let header = header.iter().map(|h| h.as_ref().to_string()).collect();
        let mut tables = self.tables.lock().await;
        tables.insert(name.to_string(), vec![header]);
    }

    /// Rewrites row 1, leaving the data rows alone.
    pub async fn set_header<T: AsRef<str>>(&self, name: &str, header: &[T]) {
        let mut tables = self.tables.lock().await;
        if let Some(rows) = tables.get_mut(name) {
            let header = header.iter().map(|h| h.as_ref().to_string()).collect();
            match rows.first_mut() {
                Some(first) => *first = header,
                None => rows.push(header),
            }
        }
    }

    pub async fn rows(&self, name: &str) -> Option<Vec<Vec<String>>> {
        let tables = self.tables.lock().await;
        tables.get(name).cloned()
    }

    pub async fn row_count(&self, name: &str) -> Option<usize> {
        let tables = self.tables.lock().await;
        tables.get(name).map(Vec::len)
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn read_header_cells(&self, table: &str) -> Result<Vec<String>> {
        let tables = self.tables.lock().await;
        let rows = tables.get(table).ok_or_else(|| IngestError::TableNotFound {
            table: table.to_string(),
        })?;
        Ok(rows.first().cloned().unwrap_or_default())
    }

    async fn append_row(&self, table: &str, row: &OutputRow) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| IngestError::TableNotFound {
                table: table.to_string(),
            })?;
        rows.push(row.to_table_values());
        Ok(())
    }
}
