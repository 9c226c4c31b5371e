use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on \"{0}\": {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("TOML parse error in \"{0}\": {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("duplicate node id \"{0}\"")]
    DuplicateNode(String),

    #[error("{0}")]
    InvalidValue(&'static str),
}
