use crate::domain::model::OutputRow;
use crate::domain::ports::TableStore;
use crate::utils::error::{IngestError, Result};
use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// One CSV file per table, `<directory>/<table>.csv`, header in row 1.
#[derive(Debug, Clone)]
pub struct CsvTableStore {
    base_path: PathBuf,
}

impl CsvTableStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", table))
    }

    /// Writes a new table file holding only the header row.
    pub fn create_table<T: AsRef<str>>(&self, table: &str, header: &[T]) -> Result<()> {
        fs::create_dir_all(&self.base_path)?;
        let mut writer = csv::Writer::from_path(self.table_path(table))?;
        writer.write_record(header.iter().map(|h| h.as_ref()))?;
        writer.flush()?;
        Ok(())
    }

    fn open_existing(&self, table: &str, path: &Path, append: bool) -> Result<File> {
        let mut options = OpenOptions::new();
        options.read(true);
        if append {
            options.append(true);
        }
        options.open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => IngestError::TableNotFound {
                table: table.to_string(),
            },
            _ => IngestError::IoError(e),
        })
    }
}

fn ends_with_newline(file: &mut File) -> Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[async_trait]
impl TableStore for CsvTableStore {
    async fn read_header_cells(&self, table: &str) -> Result<Vec<String>> {
        let path = self.table_path(table);
        let file = self.open_existing(table, &path, false)?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut record = csv::StringRecord::new();
        if !reader.read_record(&mut record)? {
            return Ok(Vec::new());
        }

        Ok(record.iter().map(str::to_string).collect())
    }

    async fn append_row(&self, table: &str, row: &OutputRow) -> Result<()> {
        let path = self.table_path(table);
        let mut file = self.open_existing(table, &path, true)?;

        // The new record must start on its own line.
        if !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(file);
        writer.write_record(row.to_table_values())?;
        writer.flush()?;

        tracing::debug!("Appended {} cells to {}", row.len(), path.display());
        Ok(())
    }
}
