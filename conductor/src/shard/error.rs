use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("sqlite error on node \"{node}\": {source}")]
    Sqlite {
        node: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to open sqlite file for node \"{node}\" at {path}: {source}")]
    Open {
        node: String,
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("node \"{0}\" is not registered with this executor")]
    UnknownNode(String),

    #[error("shard worker for node \"{0}\" panicked")]
    WorkerPanicked(String),

    #[error("shard call to node \"{0}\" timed out after {1}ms")]
    Timeout(String, u64),
}

pub type Result<T> = std::result::Result<T, Error>;
