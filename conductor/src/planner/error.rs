use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("table \"{0}\" does not exist")]
    UnknownTable(String),

    #[error("table \"{0}\" has no shards assigned")]
    NoShardsForTable(String),

    #[error("INSERT into \"{table}\" must include the shard key column \"{shard_key}\"")]
    MissingShardKey { table: String, shard_key: String },

    #[error("shard key value for \"{0}\" must be a literal or a bound parameter")]
    UnsupportedShardKeyExpr(String),

    #[error("parameter index {0} out of range for the supplied parameter vector")]
    ParamOutOfRange(usize),

    #[error("statement has no FROM clause and cannot be routed to a shard")]
    MissingFromClause,

    #[error(transparent)]
    Topology(#[from] crate::topology::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
