use super::async_job::AsyncJob;
use super::node::StorageNode;
use super::table::{Table, TableShardAssignment};
use super::virtual_index::VirtualIndex;
use super::virtual_index_entry::VirtualIndexEntry;

/// A consistent point-in-time view of the catalog, returned by
/// `getTopology()`. The planner caches this per process and invalidates it
/// on any observed DDL or index-status change (§4.4).
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    pub nodes: Vec<StorageNode>,
    pub tables: Vec<Table>,
    pub table_shards: Vec<TableShardAssignment>,
    pub virtual_indexes: Vec<VirtualIndex>,
    pub virtual_index_entries: Vec<VirtualIndexEntry>,
    pub async_jobs: Vec<AsyncJob>,
    /// Bumped on every mutation; lets a cache holder notice it has gone
    /// stale without re-fetching the whole snapshot.
    pub version: u64,
}

impl TopologySnapshot {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn shards_of(&self, table: &str) -> Vec<&TableShardAssignment> {
        self.table_shards
            .iter()
            .filter(|s| s.table_name == table)
            .collect()
    }

    pub fn index_on(&self, table: &str, columns: &[String]) -> Option<&VirtualIndex> {
        self.virtual_indexes
            .iter()
            .find(|i| i.table == table && i.columns == columns)
    }

    pub fn index_named(&self, name: &str) -> Option<&VirtualIndex> {
        self.virtual_indexes.iter().find(|i| i.name == name)
    }

    /// Shards holding at least one row with `key_value` under `index_name`,
    /// or `[]` if the entry is absent (§4.3 `getIndexedShards`).
    pub fn indexed_shards(&self, index_name: &str, key_value: &str) -> Vec<usize> {
        self.virtual_index_entries
            .iter()
            .find(|e| e.index_name == index_name && e.key_value == key_value)
            .map(|e| e.shard_ids.iter().copied().collect())
            .unwrap_or_default()
    }
}
