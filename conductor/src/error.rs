use thiserror::Error;

/// The crate-wide error type a caller of [`crate::Conductor::query`] sees.
/// Subsystem errors are wrapped rather than flattened so a caller can match
/// on which stage failed (§10.2).
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] crate::parser::Error),

    #[error(transparent)]
    Topology(#[from] crate::topology::Error),

    #[error(transparent)]
    Plan(#[from] crate::planner::Error),

    /// A shard execution failed partway through a multi-shard plan.
    /// `partial_write` is true when at least one shard had already
    /// committed its statement before the failure (§7: the router makes no
    /// attempt at cross-shard atomicity, so this is surfaced rather than
    /// hidden).
    #[error("shard execution failed (partial_write={partial_write}): {source}")]
    ShardExecution {
        partial_write: bool,
        #[source]
        source: crate::executor::Error,
    },

    #[error("failed to open a storage shard: {0}")]
    Bootstrap(#[from] crate::shard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
