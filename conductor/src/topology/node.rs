use serde::{Deserialize, Serialize};

/// Lifecycle state of a storage node. Node count is fixed between explicit
/// resharding events; `draining`/`failed` only ever move in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Active,
    Draining,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageNode {
    pub id: String,
    pub status: NodeStatus,
    pub capacity_used: u64,
    pub last_error: Option<String>,
}

impl StorageNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: NodeStatus::Active,
            capacity_used: 0,
            last_error: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == NodeStatus::Active
    }
}
