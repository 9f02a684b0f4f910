use async_trait::async_trait;
use row_ingest::core::{OutputRow, Submission, TableStore};
use row_ingest::{LockRegistry, MemoryTableStore, Result, RowIngestionHandler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Memory store that sleeps inside every call and records how many
/// read-header-then-append sequences overlap.
#[derive(Clone)]
struct SlowStore {
    inner: MemoryTableStore,
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl SlowStore {
    fn new(inner: MemoryTableStore, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn max_overlap(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TableStore for SlowStore {
    async fn read_header_cells(&self, table: &str) -> Result<Vec<String>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.inner.read_header_cells(table).await
    }

    async fn append_row(&self, table: &str, row: &OutputRow) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        let result = self.inner.append_row(table, row).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

async fn submit_concurrently(
    handler: Arc<RowIngestionHandler<SlowStore>>,
    count: usize,
) -> Vec<usize> {
    let tasks: Vec<_> = (0..count)
        .map(|i| {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let submission = Submission::from_pairs([
                    ("id", i.to_string()),
                    ("name", format!("user-{i}")),
                ]);
                handler.handle(Some(submission)).await.unwrap().unwrap();
                i
            })
        })
        .collect();

    let mut done = Vec::new();
    for task in tasks {
        done.push(task.await.unwrap());
    }
    done
}

fn assert_rows_intact(rows: &[Vec<String>], count: usize) {
    assert_eq!(rows.len(), count + 1, "one header plus one row per submission");
    assert_eq!(rows[0], vec!["id", "name"]);

    let mut ids: Vec<usize> = rows[1..]
        .iter()
        .map(|row| {
            assert_eq!(row.len(), 2);
            let id: usize = row[0].parse().unwrap();
            assert_eq!(row[1], format!("user-{id}"), "row columns are misaligned");
            id
        })
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..count).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_are_serialized() {
    let memory = MemoryTableStore::new();
    memory.create_table("Sheet1", &["id", "name"]).await;
    let store = SlowStore::new(memory.clone(), Duration::from_millis(5));

    let locks = LockRegistry::new();
    let handler = Arc::new(RowIngestionHandler::new(
        store.clone(),
        locks.lock_for("Sheet1", Duration::from_secs(10)),
    ));

    submit_concurrently(handler, 16).await;

    assert_eq!(store.max_overlap(), 1);
    assert_rows_intact(&memory.rows("Sheet1").await.unwrap(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_waiter_proceeds_after_release() {
    let memory = MemoryTableStore::new();
    memory.create_table("Sheet1", &["id", "name"]).await;
    let store = SlowStore::new(memory.clone(), Duration::from_millis(1));

    let locks = LockRegistry::new();
    let handler = Arc::new(RowIngestionHandler::new(
        store.clone(),
        locks.lock_for("Sheet1", Duration::from_secs(10)),
    ));

    let held = locks
        .lock_for("Sheet1", Duration::from_secs(1))
        .acquire()
        .await;
    assert!(held.is_held());

    let pending = tokio::spawn(submit_concurrently(Arc::clone(&handler), 1));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(memory.row_count("Sheet1").await, Some(1));

    drop(held);
    pending.await.unwrap();

    assert_rows_intact(&memory.rows("Sheet1").await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_expired_lock_wait_loses_no_rows() {
    let memory = MemoryTableStore::new();
    memory.create_table("Sheet1", &["id", "name"]).await;
    let store = SlowStore::new(memory.clone(), Duration::from_millis(20));

    let locks = LockRegistry::new();
    let handler = Arc::new(RowIngestionHandler::new(
        store.clone(),
        locks.lock_for("Sheet1", Duration::from_millis(5)),
    ));

    submit_concurrently(handler, 8).await;

    // The wait bound is far below one request's duration, so requests overlap.
    assert!(store.max_overlap() > 1);
    assert_rows_intact(&memory.rows("Sheet1").await.unwrap(), 8);
}
