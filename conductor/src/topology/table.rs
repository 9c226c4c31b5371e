use serde::{Deserialize, Serialize};

/// Hash algorithm recorded on a table so that a future change to it can't
/// silently remigrate data without anyone noticing the version bump.
pub const HASH_ALGORITHM_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub primary_key_column: String,
    /// Defaults to `primary_key_column` when not set explicitly.
    pub shard_key_column: String,
    pub num_shards: usize,
    pub block_size: usize,
    pub hash_version: u32,
    /// Set while a resharding move is in flight; gates the planner's
    /// `_virtualShard` rewriting (§4.4).
    pub resharding: bool,
}

impl Table {
    pub fn new(name: impl Into<String>, primary_key_column: impl Into<String>, num_shards: usize) -> Self {
        let pk = primary_key_column.into();
        Self {
            name: name.into(),
            shard_key_column: pk.clone(),
            primary_key_column: pk,
            num_shards,
            block_size: 1000,
            hash_version: HASH_ALGORITHM_VERSION,
            resharding: false,
        }
    }

    pub fn with_shard_key(mut self, column: impl Into<String>) -> Self {
        self.shard_key_column = column.into();
        self
    }
}

/// `(table_name, shard_id, node_id)` assignment. `shard_id` ranges over
/// `[0, table.num_shards)`; every entry must name an active node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableShardAssignment {
    pub table_name: String,
    pub shard_id: usize,
    pub node_id: String,
}
