use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexType {
    Hash,
    Unique,
}

/// Only `Ready` is ever consulted by the planner; `Building`/`Failed` cause
/// routing to fall back to all shards of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Building,
    Ready,
    Failed,
    Rebuilding,
}

impl IndexStatus {
    /// Legal transitions: building->ready, building->failed, ready->rebuilding,
    /// rebuilding->ready, rebuilding->failed.
    pub fn can_transition_to(self, next: IndexStatus) -> bool {
        use IndexStatus::*;
        matches!(
            (self, next),
            (Building, Ready) | (Building, Failed) | (Ready, Rebuilding) | (Rebuilding, Ready) | (Rebuilding, Failed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub index_type: IndexType,
    pub status: IndexStatus,
    pub error_message: Option<String>,
}

impl VirtualIndex {
    pub fn new(
        name: impl Into<String>,
        table: impl Into<String>,
        columns: Vec<String>,
        index_type: IndexType,
    ) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns,
            index_type,
            status: IndexStatus::Building,
            error_message: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == IndexStatus::Ready
    }
}
