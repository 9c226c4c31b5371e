//! The public entrypoint (§1, §10): lex/parse a statement, plan it against
//! a cached Topology snapshot, fan it out through the Executor, and forward
//! any resulting index-maintenance deltas to the queue.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::parser;
use crate::planner::{MergeStrategy, PendingIndex, Planner};
use crate::queue::{self, Queue, QueueMessage};
use crate::shard::{Row, SqliteShard, StorageShard};
use crate::topology::{InMemoryTopology, TopologySnapshot, TopologyStore};
use crate::value::Value;

/// Either the rows a `SELECT` produced or the row count an `INSERT` /
/// `UPDATE` / `DELETE` / DDL statement affected. `CREATE INDEX` always
/// reports zero rows affected; it mutates the catalog, not any shard.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub rows: Vec<Row>,
    pub rows_affected: usize,
}

struct CachedSnapshot {
    snapshot: TopologySnapshot,
    fetched_at: Instant,
}

pub struct Conductor {
    store: Arc<dyn TopologyStore>,
    executor: Executor,
    queue: Queue,
    cache: RwLock<Option<CachedSnapshot>>,
    cache_ttl: Duration,
}

impl Conductor {
    pub fn new(store: Arc<dyn TopologyStore>, shard: Arc<dyn StorageShard>, config: &conductor_config::Config) -> Self {
        let executor = Executor::new(shard.clone(), config.general.parallelism);
        let (queue, _handle) = queue::spawn(
            store.clone(),
            shard,
            config.general.queue_batch_size,
            config.general.queue_max_retries,
        );
        Self {
            store,
            executor,
            queue,
            cache: RwLock::new(None),
            cache_ttl: Duration::from_millis(config.general.topology_cache_ttl_ms),
        }
    }

    /// Bootstraps a fresh in-memory Topology sized to `config.nodes` and
    /// opens one SQLite file per node. Dispatch node ids are owned by
    /// Topology itself (`node-0`, `node-1`, ...); `config.nodes` supplies
    /// physical paths in that same positional order (§10.1, §10.3).
    pub async fn bootstrap(config: &conductor_config::Config) -> Result<Self> {
        let store: Arc<dyn TopologyStore> = Arc::new(InMemoryTopology::new());
        store.create(config.nodes.len()).await?;

        let paths: Vec<(String, std::path::PathBuf)> = config
            .nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (format!("node-{i}"), node.path.clone()))
            .collect();
        let shard: Arc<dyn StorageShard> = Arc::new(SqliteShard::open(&paths)?);

        Ok(Self::new(store, shard, config))
    }

    pub fn topology(&self) -> Arc<dyn TopologyStore> {
        self.store.clone()
    }

    /// Waits until every index-maintenance job enqueued by a prior `query`
    /// call has been applied to Topology. Exists for callers (and tests)
    /// that need to observe the catalog's eventually-consistent state
    /// deterministically rather than polling (§4.5, §5).
    pub async fn drain_maintenance(&self) {
        self.queue.drain().await;
    }

    #[tracing::instrument(skip(self, params), fields(shards))]
    pub async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let statement = parser::parse(sql)?;
        let snapshot = self.topology_snapshot().await?;
        let plan = Planner::plan(&statement, params, &snapshot)?;
        tracing::Span::current().record("shards", plan.shard_statements.len());
        debug!(shards = plan.shard_statements.len(), "planned query");

        if let MergeStrategy::CreateIndex(pending) = &plan.merge {
            self.register_index(pending).await?;
            return Ok(QueryResult::default());
        }

        let is_write_or_ddl = !matches!(plan.merge, MergeStrategy::Select(_));
        let outcome = self
            .executor
            .execute(&plan, &snapshot)
            .await
            .map_err(|source| Error::ShardExecution { partial_write: is_write_or_ddl, source })?;

        if !outcome.index_deltas.is_empty() {
            let _ = self.queue.send(QueueMessage::MaintainIndexEvents { deltas: outcome.index_deltas }).await;
        }

        if is_write_or_ddl {
            self.invalidate_cache();
        }

        Ok(QueryResult { rows: outcome.rows, rows_affected: outcome.rows_affected })
    }

    async fn register_index(&self, pending: &PendingIndex) -> Result<()> {
        let created = self
            .store
            .create_virtual_index(&pending.name, &pending.table, pending.columns.clone(), pending.index_type)
            .await;

        match created {
            Ok(()) => {
                self.invalidate_cache();
                let job = crate::topology::AsyncJob::new("build_index", pending.table.clone(), chrono::Utc::now());
                let job_id = job.id;
                self.store.enqueue_job(job).await?;
                let _ = self.queue.send(QueueMessage::BuildIndex { table: pending.table.clone(), job_id }).await;
                Ok(())
            }
            // `CREATE INDEX IF NOT EXISTS` against an already-registered
            // index is a no-op, not an error (§7).
            Err(crate::topology::Error::IndexAlreadyExists(_)) if pending.if_not_exists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn topology_snapshot(&self) -> Result<TopologySnapshot> {
        if let Some(cached) = self.cache.read().as_ref() {
            if cached.fetched_at.elapsed() < self.cache_ttl {
                return Ok(cached.snapshot.clone());
            }
        }
        let snapshot = self.store.get_topology().await?;
        *self.cache.write() = Some(CachedSnapshot { snapshot: snapshot.clone(), fetched_at: Instant::now() });
        Ok(snapshot)
    }

    fn invalidate_cache(&self) {
        *self.cache.write() = None;
    }
}
