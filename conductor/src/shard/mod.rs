//! Storage shards (§6.2): each logical shard is backed by one SQLite file
//! belonging to a storage node. The Executor dispatches rewritten
//! statements here; this module owns nothing about routing or merging.

mod convert;
mod error;
mod sqlite;

pub use error::{Error, Result};
pub use sqlite::SqliteShard;

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::value::Value;

/// One result row, column name to value, in column order.
pub type Row = IndexMap<String, Value>;

/// The outcome of running one statement against one shard.
#[derive(Debug, Clone, Default)]
pub struct ShardResponse {
    pub rows: Vec<Row>,
    pub rows_affected: usize,
}

/// The boundary the Executor talks to. A node id names a physical
/// connection; a shard id is purely a routing concept resolved before
/// reaching this trait (§1: nodes may each host more than one shard).
#[async_trait]
pub trait StorageShard: Send + Sync {
    async fn execute(&self, node_id: &str, sql: &str, params: &[Value]) -> Result<ShardResponse>;
}
