//! The maintenance queue (§4.5, §10.1): an mpsc-backed transport carrying
//! `build_index` and `maintain_index_events` jobs from the Executor to a
//! background consumer, with bounded batching and a retry-then-drop policy.

mod error;

pub use error::{Error, Result};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, warn};

use crate::executor::IndexDelta;
use crate::shard::StorageShard;
use crate::topology::{canonical_key, DeltaOp, IndexStatus, JobStatus, TopologyStore};
use crate::value::Value;

/// One unit of asynchronous catalog work (§4.5). Cloned on every retry
/// attempt, so its payload must stay cheap.
#[derive(Debug, Clone)]
pub enum QueueMessage {
    /// Scan every shard of `table` and (re)build the ready state of any
    /// `Building`/`Rebuilding` virtual index on it. `job_id` names the
    /// `AsyncJob` row the Conductor created when the `CREATE INDEX` was
    /// accepted; the consumer transitions it alongside the index itself.
    BuildIndex { table: String, job_id: uuid::Uuid },
    /// Apply already-computed index-entry deltas produced by a write.
    MaintainIndexEvents { deltas: Vec<IndexDelta> },
}

/// An envelope carries either real work or a drain barrier. Barriers are
/// never retried or cloned; they exist purely so a caller (tests, mainly)
/// can await "every message enqueued before this point has been applied"
/// without the consumer exposing any other synchronous handle.
enum Envelope {
    Message(QueueMessage),
    Barrier(tokio::sync::oneshot::Sender<()>),
}

/// The Executor-facing handle: fire-and-forget sends onto the channel the
/// consumer task drains.
#[derive(Clone)]
pub struct Queue {
    tx: mpsc::Sender<Envelope>,
}

impl Queue {
    /// Enqueues `message`. Returns an error only if the consumer task has
    /// shut down (channel closed), which callers treat as the maintenance
    /// path being unavailable rather than failing the write itself.
    pub async fn send(&self, message: QueueMessage) -> std::result::Result<(), QueueMessage> {
        self.tx
            .send(Envelope::Message(message))
            .await
            .map_err(|e| match e.0 {
                Envelope::Message(m) => m,
                Envelope::Barrier(_) => unreachable!(),
            })
    }

    /// Waits until every message sent before this call has been processed
    /// (successfully or exhausted its retries). Because the consumer is a
    /// single task draining one ordered channel, a barrier enqueued after
    /// N messages is only reached once all N have been handled.
    pub async fn drain(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        if self.tx.send(Envelope::Barrier(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }
}

/// Spawns the consumer loop and returns a handle to send into it plus its
/// `JoinHandle` (so callers can await a clean shutdown in tests).
pub fn spawn(
    store: Arc<dyn TopologyStore>,
    shard: Arc<dyn StorageShard>,
    batch_size: usize,
    max_retries: usize,
) -> (Queue, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(batch_size.max(1) * 4);
    let handle = tokio::spawn(run(rx, store, shard, batch_size.max(1), max_retries));
    (Queue { tx }, handle)
}

async fn run(
    mut rx: mpsc::Receiver<Envelope>,
    store: Arc<dyn TopologyStore>,
    shard: Arc<dyn StorageShard>,
    batch_size: usize,
    max_retries: usize,
) {
    loop {
        let Some(first) = rx.recv().await else { return };
        let mut batch = vec![first];
        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(message) => batch.push(message),
                Err(_) => break,
            }
        }

        for envelope in batch {
            match envelope {
                Envelope::Message(message) => process_with_retry(&store, &shard, message, max_retries).await,
                Envelope::Barrier(tx) => {
                    let _ = tx.send(());
                }
            }
        }
    }
}

async fn process_with_retry(store: &Arc<dyn TopologyStore>, shard: &Arc<dyn StorageShard>, message: QueueMessage, max_retries: usize) {
    for attempt in 0..=max_retries {
        match process(store, shard, message.clone()).await {
            Ok(()) => return,
            Err(err) if attempt < max_retries => {
                warn!(attempt, max_retries, %err, "maintenance job failed, retrying");
            }
            Err(err) => {
                error!(%err, "maintenance job exhausted retries, dropping to dead-letter sink");
            }
        }
    }
}

async fn process(store: &Arc<dyn TopologyStore>, shard: &Arc<dyn StorageShard>, message: QueueMessage) -> Result<()> {
    match message {
        QueueMessage::BuildIndex { table, job_id } => build_index(store, shard, &table, job_id).await,
        QueueMessage::MaintainIndexEvents { deltas } => apply_deltas(store, deltas).await,
    }
}

async fn apply_deltas(store: &Arc<dyn TopologyStore>, deltas: Vec<IndexDelta>) -> Result<()> {
    for delta in deltas {
        store.apply_index_delta(&delta.index_name, delta.shard_id, &delta.key_value, delta.op).await?;
    }
    Ok(())
}

/// Rebuilds the index-entry catalog for every `Building`/`Rebuilding`
/// virtual index on `table` from scratch, by scanning each shard with a
/// `SELECT DISTINCT <columns> FROM table` (§4.5). A single shard failure
/// fails the whole index (marked `Failed` with the error), not just that
/// shard's rows, so a partially built index is never mistaken for ready.
async fn build_index(store: &Arc<dyn TopologyStore>, shard: &Arc<dyn StorageShard>, table: &str, job_id: uuid::Uuid) -> Result<()> {
    store.update_job_status(job_id, JobStatus::Running, None).await?;

    let snapshot = store.get_topology().await?;
    let targets: Vec<(usize, String)> = snapshot
        .shards_of(table)
        .into_iter()
        .map(|t| (t.shard_id, t.node_id.clone()))
        .collect();

    let indexes: Vec<_> = snapshot
        .virtual_indexes
        .iter()
        .filter(|i| i.table == table && matches!(i.status, IndexStatus::Building | IndexStatus::Rebuilding))
        .cloned()
        .collect();

    let mut job_error: Option<String> = None;

    for index in indexes {
        let columns = index.columns.join(", ");
        let sql = format!("SELECT DISTINCT {columns} FROM {table}");

        let mut entries: HashMap<String, BTreeSet<usize>> = HashMap::new();
        let mut failure: Option<String> = None;

        for (shard_id, node_id) in &targets {
            match shard.execute(node_id, &sql, &[]).await {
                Ok(response) => {
                    for row in response.rows {
                        let values: Vec<Value> = index.columns.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Null)).collect();
                        if let Some(key) = canonical_key(&values) {
                            entries.entry(key).or_default().insert(*shard_id);
                        }
                    }
                }
                Err(e) => {
                    failure = Some(e.to_string());
                    break;
                }
            }
        }

        match failure {
            Some(message) => {
                store.update_index_status(&index.name, IndexStatus::Failed, Some(message.clone())).await?;
                job_error.get_or_insert(message);
            }
            None => {
                store.batch_upsert_index_entries(&index.name, entries.into_iter().collect()).await?;
                store.update_index_status(&index.name, IndexStatus::Ready, None).await?;
            }
        }
    }

    match &job_error {
        Some(message) => store.update_job_status(job_id, JobStatus::Failed, Some(message.clone())).await?,
        None => store.update_job_status(job_id, JobStatus::Completed, None).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shard::SqliteShard;
    use crate::topology::{InMemoryTopology, IndexType};

    #[tokio::test]
    async fn test_build_index_marks_ready_on_success() {
        let store: Arc<dyn TopologyStore> = Arc::new(InMemoryTopology::new());
        store.create(1).await.unwrap();
        store
            .update_topology(crate::topology::TopologyDelta {
                add: vec![crate::topology::Table::new("users", "id", 1)],
                ..Default::default()
            })
            .await
            .unwrap();
        store.create_virtual_index("by_email", "users", vec!["email".to_string()], IndexType::Hash).await.unwrap();
        let job = crate::topology::AsyncJob::new("build_index", "users", chrono::Utc::now());
        let job_id = job.id;
        store.enqueue_job(job).await.unwrap();

        let shard: Arc<dyn StorageShard> = Arc::new(SqliteShard::open_in_memory(&["node-0"]));
        shard.execute("node-0", "CREATE TABLE users (id INTEGER, email TEXT)", &[]).await.unwrap();
        shard.execute("node-0", "INSERT INTO users (id, email) VALUES (1, 'a@example.com')", &[]).await.unwrap();

        build_index(&store, &shard, "users", job_id).await.unwrap();

        let snapshot = store.get_topology().await.unwrap();
        let index = snapshot.index_named("by_email").unwrap();
        assert_eq!(index.status, IndexStatus::Ready);
        assert_eq!(snapshot.indexed_shards("by_email", "a@example.com"), vec![0]);
        let job = snapshot.async_jobs.iter().find(|j| j.id == job_id).unwrap();
        assert_eq!(job.status, crate::topology::JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_build_index_marks_job_failed_on_bad_column() {
        let store: Arc<dyn TopologyStore> = Arc::new(InMemoryTopology::new());
        store.create(1).await.unwrap();
        store
            .update_topology(crate::topology::TopologyDelta {
                add: vec![crate::topology::Table::new("users", "id", 1)],
                ..Default::default()
            })
            .await
            .unwrap();
        store.create_virtual_index("idx_bad", "users", vec!["nonexistent_column".to_string()], IndexType::Hash).await.unwrap();
        let job = crate::topology::AsyncJob::new("build_index", "users", chrono::Utc::now());
        let job_id = job.id;
        store.enqueue_job(job).await.unwrap();

        let shard: Arc<dyn StorageShard> = Arc::new(SqliteShard::open_in_memory(&["node-0"]));
        shard.execute("node-0", "CREATE TABLE users (id INTEGER, name TEXT)", &[]).await.unwrap();

        build_index(&store, &shard, "users", job_id).await.unwrap();

        let snapshot = store.get_topology().await.unwrap();
        let index = snapshot.index_named("idx_bad").unwrap();
        assert_eq!(index.status, IndexStatus::Failed);
        assert!(index.error_message.as_ref().unwrap().contains("nonexistent_column"));
        let job = snapshot.async_jobs.iter().find(|j| j.id == job_id).unwrap();
        assert_eq!(job.status, crate::topology::JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_apply_deltas_updates_entries() {
        let store: Arc<dyn TopologyStore> = Arc::new(InMemoryTopology::new());
        store.create(1).await.unwrap();
        store
            .update_topology(crate::topology::TopologyDelta {
                add: vec![crate::topology::Table::new("users", "id", 1)],
                ..Default::default()
            })
            .await
            .unwrap();
        store.create_virtual_index("by_email", "users", vec!["email".to_string()], IndexType::Hash).await.unwrap();

        let deltas = vec![IndexDelta { index_name: "by_email".into(), shard_id: 0, key_value: "a@example.com".into(), op: DeltaOp::Add }];
        apply_deltas(&store, deltas).await.unwrap();

        let snapshot = store.get_topology().await.unwrap();
        assert_eq!(snapshot.indexed_shards("by_email", "a@example.com"), vec![0]);
    }
}
