use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A storage node bootstrapped into the cluster. The node count is fixed
/// until an explicit resharding event; this is simply the list the
/// `Topology::create` call is seeded with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Node {
    /// Identifier, conventionally `node-i`.
    pub id: String,

    /// Path to the SQLite file backing this node.
    pub path: PathBuf,
}
