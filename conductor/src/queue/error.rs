use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Topology(#[from] crate::topology::Error),

    #[error(transparent)]
    Shard(#[from] crate::shard::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
