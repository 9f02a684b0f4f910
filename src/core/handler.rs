use crate::core::lock::{AdvisoryLock, LockLease, LockRegistry};
use crate::core::mapping::build_output_row;
use crate::domain::model::{Acknowledgment, HeaderRow, Submission};
use crate::domain::ports::{Clock, ConfigProvider, SystemClock, TableStore};
use crate::utils::error::{IngestError, Result};
use std::sync::Arc;

/// Appends one form submission per call to a fixed table.
pub struct RowIngestionHandler<S: TableStore> {
    store: S,
    table: String,
    lock: AdvisoryLock,
    clock: Arc<dyn Clock>,
    strict_lock: bool,
}

impl<S: TableStore> RowIngestionHandler<S> {
    pub fn new(store: S, lock: AdvisoryLock) -> Self {
        Self {
            store,
            table: lock.table().to_string(),
            lock,
            clock: Arc::new(SystemClock),
            strict_lock: false,
        }
    }

    pub fn from_config<C: ConfigProvider>(store: S, config: &C, locks: &LockRegistry) -> Self {
        let lock = locks.lock_for(config.table_name(), config.lock_wait());
        Self::new(store, lock).with_strict_lock(config.strict_lock())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fail with `LockTimeout` instead of continuing unsynchronized.
    pub fn with_strict_lock(mut self, strict: bool) -> Self {
        self.strict_lock = strict;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns `Ok(None)` without touching the table when there is no request.
    pub async fn handle(&self, submission: Option<Submission>) -> Result<Option<Acknowledgment>> {
        let Some(submission) = submission else {
            tracing::debug!("No request supplied, nothing to append");
            return Ok(None);
        };

        // Held until the end of this function, on every exit path.
        let _lease = self.acquire_lock().await?;

        let cells = self.store.read_header_cells(&self.table).await?;
        let header =
            HeaderRow::from_cells(cells).ok_or_else(|| IngestError::HeaderRegionEmpty {
                table: self.table.clone(),
            })?;
        tracing::debug!(table = %self.table, columns = header.len(), "Read header row");

        let row = build_output_row(&header, &submission, self.clock.now());

        self.store.append_row(&self.table, &row).await?;
        tracing::info!(
            table = %self.table,
            columns = row.len(),
            fields = submission.len(),
            "Appended row"
        );

        Ok(Some(Acknowledgment::success(row)))
    }

    async fn acquire_lock(&self) -> Result<LockLease> {
        let lease = self.lock.acquire().await;
        if lease.is_held() {
            return Ok(lease);
        }

        let waited_ms = self.lock.wait().as_millis() as u64;
        if self.strict_lock {
            return Err(IngestError::LockTimeout {
                table: self.table.clone(),
                waited_ms,
            });
        }

        tracing::warn!(
            table = %self.table,
            waited_ms,
            "Lock wait expired, appending without synchronization"
        );
        Ok(lease)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory_store::MemoryTableStore;
    use crate::domain::model::Cell;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    }

    async fn handler_with(
        headers: &[&str],
        wait: Duration,
    ) -> (RowIngestionHandler<MemoryTableStore>, LockRegistry) {
        let store = MemoryTableStore::new();
        store.create_table("Sheet1", headers).await;
        let locks = LockRegistry::new();
        let handler = RowIngestionHandler::new(store, locks.lock_for("Sheet1", wait))
            .with_clock(Arc::new(FixedClock(fixed_at())));
        (handler, locks)
    }

    #[tokio::test]
    async fn test_absent_request_is_noop() {
        let (handler, _) = handler_with(&["name"], Duration::from_secs(1)).await;

        let result = handler.handle(None).await.unwrap();

        assert!(result.is_none());
        assert_eq!(handler.store().row_count("Sheet1").await, Some(1));
    }

    #[tokio::test]
    async fn test_appends_mapped_row() {
        let (handler, _) = handler_with(&["timestamp", "name", "email"], Duration::from_secs(1)).await;
        let submission = Submission::from_pairs([("name", "Ada"), ("email", "ada@x.com")]);

        let ack = handler.handle(Some(submission)).await.unwrap().unwrap();

        assert_eq!(ack.result, "success");
        assert_eq!(
            ack.row.cells(),
            [
                Cell::Timestamp(fixed_at()),
                Cell::Text("Ada".to_string()),
                Cell::Text("ada@x.com".to_string())
            ]
        );
        let rows = handler.store().rows("Sheet1").await.unwrap();
        assert_eq!(
            rows[1],
            vec!["2024-01-02T03:04:05.000Z", "Ada", "ada@x.com"]
        );
    }

    #[tokio::test]
    async fn test_rows_are_only_appended() {
        let (handler, _) = handler_with(&["name", "note"], Duration::from_secs(1)).await;

        for i in 0..5 {
            let submission = Submission::from_pairs([("name", format!("user-{i}"))]);
            handler.handle(Some(submission)).await.unwrap();
        }

        let rows = handler.store().rows("Sheet1").await.unwrap();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], vec!["name", "note"]);
        for (i, row) in rows[1..].iter().enumerate() {
            assert_eq!(row, &vec![format!("user-{i}"), String::new()]);
        }
    }

    #[tokio::test]
    async fn test_header_is_read_fresh_each_request() {
        let (handler, _) = handler_with(&["name"], Duration::from_secs(1)).await;
        handler
            .handle(Some(Submission::from_pairs([("name", "A"), ("city", "Oslo")])))
            .await
            .unwrap();

        handler.store().set_header("Sheet1", &["city", "name"]).await;
        let ack = handler
            .handle(Some(Submission::from_pairs([("name", "B"), ("city", "Rome")])))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ack.row.to_table_values(), vec!["Rome", "B"]);
        let rows = handler.store().rows("Sheet1").await.unwrap();
        assert_eq!(rows[1], vec!["A"]);
    }

    #[tokio::test]
    async fn test_missing_table_is_error() {
        let store = MemoryTableStore::new();
        let handler = RowIngestionHandler::new(
            store,
            LockRegistry::new().lock_for("Missing", Duration::from_millis(50)),
        );

        let err = handler
            .handle(Some(Submission::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::TableNotFound { ref table } if table == "Missing"));
    }

    #[tokio::test]
    async fn test_error_path_releases_lock() {
        let (handler, locks) = handler_with(&[], Duration::from_millis(50)).await;

        let err = handler
            .handle(Some(Submission::from_pairs([("name", "x")])))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::HeaderRegionEmpty { .. }));

        let lease = locks
            .lock_for("Sheet1", Duration::from_millis(1))
            .acquire()
            .await;
        assert!(lease.is_held());
    }

    #[tokio::test]
    async fn test_lock_timeout_proceeds_by_default() {
        let (handler, locks) = handler_with(&["name"], Duration::from_millis(20)).await;
        let _held = locks
            .lock_for("Sheet1", Duration::from_millis(20))
            .acquire()
            .await;

        let ack = handler
            .handle(Some(Submission::from_pairs([("name", "late")])))
            .await
            .unwrap();

        assert!(ack.is_some());
        assert_eq!(handler.store().row_count("Sheet1").await, Some(2));
    }

    #[tokio::test]
    async fn test_strict_lock_timeout_appends_nothing() {
        let (handler, locks) = handler_with(&["name"], Duration::from_millis(20)).await;
        let handler = handler.with_strict_lock(true);
        let _held = locks
            .lock_for("Sheet1", Duration::from_millis(20))
            .acquire()
            .await;

        let err = handler
            .handle(Some(Submission::from_pairs([("name", "late")])))
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::LockTimeout { waited_ms: 20, .. }));
        assert_eq!(handler.store().row_count("Sheet1").await, Some(1));
    }
}
