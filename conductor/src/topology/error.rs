use thiserror::Error;

use super::virtual_index::IndexStatus;

#[derive(Debug, Error)]
pub enum Error {
    #[error("topology already created")]
    AlreadyCreated,

    #[error("topology not created")]
    NotCreated,

    #[error("numNodes must be >= 1, got {0}")]
    InvalidNodeCount(usize),

    #[error("table \"{0}\" does not exist")]
    UnknownTable(String),

    #[error("table \"{0}\" already exists")]
    DuplicateTable(String),

    #[error("node \"{0}\" does not exist or is not active")]
    UnknownNode(String),

    #[error("virtual index \"{0}\" already exists")]
    IndexAlreadyExists(String),

    #[error("virtual index \"{0}\" does not exist")]
    UnknownIndex(String),

    #[error("illegal index status transition {from:?} -> {to:?} for \"{index}\"")]
    IllegalTransition {
        index: String,
        from: IndexStatus,
        to: IndexStatus,
    },

    #[error("shard_id {shard_id} is not a shard of table \"{table}\"")]
    ShardNotInTable { table: String, shard_id: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
