use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::async_job::AsyncJob;
use super::error::{Error, Result};
use super::node::StorageNode;
use super::snapshot::TopologySnapshot;
use super::table::{Table, TableShardAssignment};
use super::virtual_index::{IndexStatus, IndexType, VirtualIndex};
use super::virtual_index_entry::VirtualIndexEntry;

/// One row's worth of insert/update/remove for `updateTopology` (§4.3).
#[derive(Debug, Default, Clone)]
pub struct TopologyDelta {
    pub add: Vec<Table>,
    pub update: Vec<Table>,
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOp {
    Add,
    Remove,
}

/// Trait seam over Topology's persistence so a durable backend can replace
/// the in-memory implementation without touching any caller (§10.3).
#[async_trait]
pub trait TopologyStore: Send + Sync {
    async fn create(&self, num_nodes: usize) -> Result<()>;
    async fn get_topology(&self) -> Result<TopologySnapshot>;
    async fn update_topology(&self, delta: TopologyDelta) -> Result<()>;
    async fn create_virtual_index(
        &self,
        name: &str,
        table: &str,
        columns: Vec<String>,
        index_type: IndexType,
    ) -> Result<()>;
    async fn update_index_status(
        &self,
        name: &str,
        status: IndexStatus,
        error: Option<String>,
    ) -> Result<()>;
    async fn batch_upsert_index_entries(
        &self,
        name: &str,
        entries: Vec<(String, BTreeSet<usize>)>,
    ) -> Result<()>;
    async fn apply_index_delta(
        &self,
        name: &str,
        shard_id: usize,
        key_value: &str,
        op: DeltaOp,
    ) -> Result<()>;
    async fn get_indexed_shards(&self, name: &str, key_value: &str) -> Result<Vec<usize>>;
    async fn drop_virtual_index(&self, name: &str) -> Result<()>;
    async fn enqueue_job(&self, job: AsyncJob) -> Result<()>;
    async fn update_job_status(&self, id: uuid::Uuid, status: super::async_job::JobStatus, error: Option<String>) -> Result<()>;
}

struct Inner {
    created: bool,
    nodes: Vec<StorageNode>,
    tables: Vec<Table>,
    table_shards: Vec<TableShardAssignment>,
    virtual_indexes: Vec<VirtualIndex>,
    async_jobs: Vec<AsyncJob>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            created: false,
            nodes: Vec::new(),
            tables: Vec::new(),
            table_shards: Vec::new(),
            virtual_indexes: Vec::new(),
            async_jobs: Vec::new(),
        }
    }
}

/// In-memory Topology. Structural mutations (nodes, tables, table_shards,
/// index definitions, jobs) are serialized behind one `RwLock` so that
/// `getTopology()` always observes a consistent cross-collection snapshot;
/// high-frequency index-entry deltas instead go through a `DashMap` keyed by
/// `(index_name, key_value)` so they don't contend with unrelated reads.
pub struct InMemoryTopology {
    inner: RwLock<Inner>,
    entries: DashMap<(String, String), BTreeSet<usize>>,
    version: AtomicU64,
}

impl Default for InMemoryTopology {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            entries: DashMap::new(),
            version: AtomicU64::new(0),
        }
    }
}

impl InMemoryTopology {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl TopologyStore for InMemoryTopology {
    async fn create(&self, num_nodes: usize) -> Result<()> {
        if num_nodes < 1 {
            return Err(Error::InvalidNodeCount(num_nodes));
        }
        let mut inner = self.inner.write();
        if inner.created {
            return Err(Error::AlreadyCreated);
        }
        inner.nodes = (0..num_nodes)
            .map(|i| StorageNode::new(format!("node-{i}")))
            .collect();
        inner.created = true;
        self.bump_version();
        Ok(())
    }

    async fn get_topology(&self) -> Result<TopologySnapshot> {
        let inner = self.inner.read();
        if !inner.created {
            return Err(Error::NotCreated);
        }
        let virtual_index_entries = self
            .entries
            .iter()
            .map(|e| VirtualIndexEntry {
                index_name: e.key().0.clone(),
                key_value: e.key().1.clone(),
                shard_ids: e.value().clone(),
            })
            .collect();
        Ok(TopologySnapshot {
            nodes: inner.nodes.clone(),
            tables: inner.tables.clone(),
            table_shards: inner.table_shards.clone(),
            virtual_indexes: inner.virtual_indexes.clone(),
            virtual_index_entries,
            async_jobs: inner.async_jobs.clone(),
            version: self.version.load(Ordering::SeqCst),
        })
    }

    async fn update_topology(&self, delta: TopologyDelta) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.created {
            return Err(Error::NotCreated);
        }

        for table in delta.add {
            if inner.tables.iter().any(|t| t.name == table.name) {
                return Err(Error::DuplicateTable(table.name));
            }
            let num_nodes = inner.nodes.len();
            let shards: Vec<TableShardAssignment> = (0..table.num_shards)
                .map(|shard_id| TableShardAssignment {
                    table_name: table.name.clone(),
                    shard_id,
                    node_id: inner.nodes[shard_id % num_nodes].id.clone(),
                })
                .collect();
            inner.table_shards.extend(shards);
            inner.tables.push(table);
        }

        for table in delta.update {
            match inner.tables.iter_mut().find(|t| t.name == table.name) {
                Some(existing) => *existing = table,
                None => return Err(Error::UnknownTable(table.name)),
            }
        }

        for name in delta.remove {
            let before = inner.tables.len();
            inner.tables.retain(|t| t.name != name);
            if inner.tables.len() == before {
                return Err(Error::UnknownTable(name));
            }
            inner.table_shards.retain(|s| s.table_name != name);
        }

        self.bump_version();
        Ok(())
    }

    async fn create_virtual_index(
        &self,
        name: &str,
        table: &str,
        columns: Vec<String>,
        index_type: IndexType,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.created {
            return Err(Error::NotCreated);
        }
        if !inner.tables.iter().any(|t| t.name == table) {
            return Err(Error::UnknownTable(table.to_string()));
        }
        if inner.virtual_indexes.iter().any(|i| i.name == name) {
            return Err(Error::IndexAlreadyExists(name.to_string()));
        }
        inner
            .virtual_indexes
            .push(VirtualIndex::new(name, table, columns, index_type));
        self.bump_version();
        Ok(())
    }

    async fn update_index_status(
        &self,
        name: &str,
        status: IndexStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let index = inner
            .virtual_indexes
            .iter_mut()
            .find(|i| i.name == name)
            .ok_or_else(|| Error::UnknownIndex(name.to_string()))?;

        if !index.status.can_transition_to(status) {
            return Err(Error::IllegalTransition {
                index: name.to_string(),
                from: index.status,
                to: status,
            });
        }

        index.status = status;
        index.error_message = error;
        self.bump_version();
        Ok(())
    }

    async fn batch_upsert_index_entries(
        &self,
        name: &str,
        entries: Vec<(String, BTreeSet<usize>)>,
    ) -> Result<()> {
        {
            let inner = self.inner.read();
            if !inner.virtual_indexes.iter().any(|i| i.name == name) {
                return Err(Error::UnknownIndex(name.to_string()));
            }
            let table = &inner.virtual_indexes.iter().find(|i| i.name == name).unwrap().table;
            let valid_shards: BTreeSet<usize> = inner
                .table_shards
                .iter()
                .filter(|s| &s.table_name == table)
                .map(|s| s.shard_id)
                .collect();
            for (_, shard_ids) in &entries {
                if let Some(bad) = shard_ids.iter().find(|s| !valid_shards.contains(s)) {
                    return Err(Error::ShardNotInTable {
                        table: table.clone(),
                        shard_id: *bad,
                    });
                }
            }
        }

        for (key_value, shard_ids) in entries {
            let entry_key = (name.to_string(), key_value);
            if shard_ids.is_empty() {
                self.entries.remove(&entry_key);
            } else {
                self.entries.insert(entry_key, shard_ids);
            }
        }

        self.bump_version();
        Ok(())
    }

    async fn apply_index_delta(
        &self,
        name: &str,
        shard_id: usize,
        key_value: &str,
        op: DeltaOp,
    ) -> Result<()> {
        {
            let inner = self.inner.read();
            let index = inner
                .virtual_indexes
                .iter()
                .find(|i| i.name == name)
                .ok_or_else(|| Error::UnknownIndex(name.to_string()))?;
            let is_table_shard = inner
                .table_shards
                .iter()
                .any(|s| s.table_name == index.table && s.shard_id == shard_id);
            if !is_table_shard {
                return Err(Error::ShardNotInTable {
                    table: index.table.clone(),
                    shard_id,
                });
            }
        }

        let entry_key = (name.to_string(), key_value.to_string());
        let mut remove_entry = false;
        {
            let mut set = self.entries.entry(entry_key.clone()).or_default();
            match op {
                DeltaOp::Add => {
                    set.insert(shard_id);
                }
                DeltaOp::Remove => {
                    set.remove(&shard_id);
                    if set.is_empty() {
                        remove_entry = true;
                    }
                }
            }
        }
        if remove_entry {
            self.entries.remove(&entry_key);
        }

        self.bump_version();
        Ok(())
    }

    async fn get_indexed_shards(&self, name: &str, key_value: &str) -> Result<Vec<usize>> {
        Ok(self
            .entries
            .get(&(name.to_string(), key_value.to_string()))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    async fn drop_virtual_index(&self, name: &str) -> Result<()> {
        let mut inner = self.inner.write();
        let before = inner.virtual_indexes.len();
        inner.virtual_indexes.retain(|i| i.name != name);
        if inner.virtual_indexes.len() == before {
            return Err(Error::UnknownIndex(name.to_string()));
        }
        self.entries.retain(|k, _| k.0 != name);
        self.bump_version();
        Ok(())
    }

    async fn enqueue_job(&self, job: AsyncJob) -> Result<()> {
        let mut inner = self.inner.write();
        inner.async_jobs.push(job);
        self.bump_version();
        Ok(())
    }

    async fn update_job_status(
        &self,
        id: uuid::Uuid,
        status: super::async_job::JobStatus,
        error: Option<String>,
    ) -> Result<()> {
        let mut inner = self.inner.write();
        let job = inner
            .async_jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or(Error::NotCreated)?;
        job.status = status;
        job.error = error;
        self.bump_version();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, shards: usize) -> Table {
        Table::new(name, "id", shards)
    }

    #[tokio::test]
    async fn test_create_then_double_create_fails() {
        let topo = InMemoryTopology::new();
        topo.create(2).await.unwrap();
        assert!(matches!(topo.create(2).await, Err(Error::AlreadyCreated)));
    }

    #[tokio::test]
    async fn test_get_topology_before_create_fails() {
        let topo = InMemoryTopology::new();
        assert!(matches!(topo.get_topology().await, Err(Error::NotCreated)));
    }

    #[tokio::test]
    async fn test_add_table_materializes_shards_round_robin() {
        let topo = InMemoryTopology::new();
        topo.create(2).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table("users", 4)],
            ..Default::default()
        })
        .await
        .unwrap();

        let snap = topo.get_topology().await.unwrap();
        let shards = snap.shards_of("users");
        assert_eq!(shards.len(), 4);
        assert_eq!(shards[0].node_id, "node-0");
        assert_eq!(shards[1].node_id, "node-1");
        assert_eq!(shards[2].node_id, "node-0");
        assert_eq!(shards[3].node_id, "node-1");
    }

    #[tokio::test]
    async fn test_duplicate_table_rejected() {
        let topo = InMemoryTopology::new();
        topo.create(1).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table("users", 1)],
            ..Default::default()
        })
        .await
        .unwrap();
        let err = topo
            .update_topology(TopologyDelta {
                add: vec![table("users", 1)],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateTable(_)));
    }

    #[tokio::test]
    async fn test_index_lifecycle_transitions() {
        let topo = InMemoryTopology::new();
        topo.create(1).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table("users", 1)],
            ..Default::default()
        })
        .await
        .unwrap();
        topo.create_virtual_index("idx_email", "users", vec!["email".into()], IndexType::Hash)
            .await
            .unwrap();

        let err = topo
            .create_virtual_index("idx_email", "users", vec!["email".into()], IndexType::Hash)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IndexAlreadyExists(_)));

        // building -> rebuilding is illegal.
        let err = topo
            .update_index_status("idx_email", IndexStatus::Rebuilding, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::IllegalTransition { .. }));

        topo.update_index_status("idx_email", IndexStatus::Ready, None)
            .await
            .unwrap();
        topo.update_index_status("idx_email", IndexStatus::Rebuilding, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_apply_index_delta_dedupes_and_empties_remove_entry() {
        let topo = InMemoryTopology::new();
        topo.create(2).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table("users", 2)],
            ..Default::default()
        })
        .await
        .unwrap();
        topo.create_virtual_index("idx_email", "users", vec!["email".into()], IndexType::Hash)
            .await
            .unwrap();

        topo.apply_index_delta("idx_email", 0, "a@example.com", DeltaOp::Add)
            .await
            .unwrap();
        topo.apply_index_delta("idx_email", 1, "a@example.com", DeltaOp::Add)
            .await
            .unwrap();
        assert_eq!(
            topo.get_indexed_shards("idx_email", "a@example.com").await.unwrap(),
            vec![0, 1]
        );

        topo.apply_index_delta("idx_email", 0, "a@example.com", DeltaOp::Remove)
            .await
            .unwrap();
        assert_eq!(
            topo.get_indexed_shards("idx_email", "a@example.com").await.unwrap(),
            vec![1]
        );

        topo.apply_index_delta("idx_email", 1, "a@example.com", DeltaOp::Remove)
            .await
            .unwrap();
        assert!(topo
            .get_indexed_shards("idx_email", "a@example.com")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_apply_index_delta_rejects_shard_not_in_table() {
        let topo = InMemoryTopology::new();
        topo.create(1).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table("users", 1)],
            ..Default::default()
        })
        .await
        .unwrap();
        topo.create_virtual_index("idx_email", "users", vec!["email".into()], IndexType::Hash)
            .await
            .unwrap();

        let err = topo
            .apply_index_delta("idx_email", 99, "x", DeltaOp::Add)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ShardNotInTable { .. }));
    }

    #[tokio::test]
    async fn test_get_indexed_shards_empty_when_absent() {
        let topo = InMemoryTopology::new();
        topo.create(1).await.unwrap();
        assert!(topo
            .get_indexed_shards("nonexistent", "x")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_drop_virtual_index_removes_entries() {
        let topo = InMemoryTopology::new();
        topo.create(1).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table("users", 1)],
            ..Default::default()
        })
        .await
        .unwrap();
        topo.create_virtual_index("idx_email", "users", vec!["email".into()], IndexType::Hash)
            .await
            .unwrap();
        topo.apply_index_delta("idx_email", 0, "a", DeltaOp::Add)
            .await
            .unwrap();

        topo.drop_virtual_index("idx_email").await.unwrap();
        let snap = topo.get_topology().await.unwrap();
        assert!(snap.virtual_indexes.is_empty());
        assert!(snap.virtual_index_entries.is_empty());
    }

    #[tokio::test]
    async fn test_idempotent_batch_upsert_same_key() {
        let topo = InMemoryTopology::new();
        topo.create(1).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table("users", 1)],
            ..Default::default()
        })
        .await
        .unwrap();
        topo.create_virtual_index("idx_email", "users", vec!["email".into()], IndexType::Hash)
            .await
            .unwrap();

        let entries = vec![("a".to_string(), BTreeSet::from([0usize]))];
        topo.batch_upsert_index_entries("idx_email", entries.clone())
            .await
            .unwrap();
        topo.batch_upsert_index_entries("idx_email", entries)
            .await
            .unwrap();

        assert_eq!(
            topo.get_indexed_shards("idx_email", "a").await.unwrap(),
            vec![0]
        );
    }
}
