//! Configuration for the conductor SQL router.
//!
//! Mirrors the shape of a `pgdog.toml`: a single TOML file with a `[general]`
//! section for router-wide tunables and a list of `[[nodes]]` describing the
//! storage nodes the cluster bootstraps with.

pub mod error;
pub mod general;
pub mod node;

pub use error::Error;
pub use general::General;
pub use node::Node;

use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

/// Top-level configuration, loaded from a single TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: General,

    #[serde(default, rename = "nodes")]
    pub nodes: Vec<Node>,
}

impl Config {
    /// Load configuration from a TOML file on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents =
            read_to_string(path).map_err(|err| Error::Io(path.to_path_buf(), err))?;
        Self::parse(&contents, path)
    }

    /// Parse configuration from an in-memory TOML document. Exposed separately
    /// from [`Config::load`] so the `configcheck` CLI subcommand and tests can
    /// validate a string without touching the filesystem.
    pub fn parse(contents: &str, path: impl AsRef<Path>) -> Result<Self, Error> {
        let config: Config = toml::from_str(contents)
            .map_err(|err| Error::Parse(path.as_ref().to_path_buf(), err))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.general.parallelism == 0 {
            return Err(Error::InvalidValue("general.parallelism must be >= 1"));
        }

        if self.nodes.is_empty() {
            return Err(Error::InvalidValue("at least one node is required"));
        }

        let mut seen = std::collections::HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                return Err(Error::DuplicateNode(node.id.clone()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_serializable() {
        let config = Config::default();
        toml::to_string(&config).unwrap();
    }

    #[test]
    fn test_parse_minimal() {
        let toml = r#"
            [[nodes]]
            id = "node-0"
            path = "/tmp/shard0.db"

            [[nodes]]
            id = "node-1"
            path = "/tmp/shard1.db"
        "#;

        let config = Config::parse(toml, "conductor.toml").unwrap();
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.general.parallelism, 7);
    }

    #[test]
    fn test_reject_duplicate_node_ids() {
        let toml = r#"
            [[nodes]]
            id = "node-0"
            path = "/tmp/a.db"

            [[nodes]]
            id = "node-0"
            path = "/tmp/b.db"
        "#;

        let err = Config::parse(toml, "conductor.toml").unwrap_err();
        assert!(matches!(err, Error::DuplicateNode(_)));
    }

    #[test]
    fn test_reject_zero_parallelism() {
        let toml = r#"
            [general]
            parallelism = 0

            [[nodes]]
            id = "node-0"
            path = "/tmp/a.db"
        "#;

        let err = Config::parse(toml, "conductor.toml").unwrap_err();
        assert!(matches!(err, Error::InvalidValue(_)));
    }
}
