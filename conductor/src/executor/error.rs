use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Shard(#[from] crate::shard::Error),

    /// A DDL plan (§4.4 rule 1) requires every targeted node to succeed;
    /// `node` is the first one that didn't.
    #[error("node \"{node}\" failed to apply DDL: {source}")]
    DdlPartiallyApplied { node: String, #[source] source: crate::shard::Error },

    /// A WHERE clause lifted into a capture `SELECT` referenced a parameter
    /// index the write's own parameter vector doesn't have.
    #[error("parameter index {0} out of range while capturing indexed columns for maintenance")]
    ParamOutOfRange(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
