use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Created when a `CREATE INDEX` is accepted; transitioned by the queue
/// consumer as it works the corresponding `build_index` job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsyncJob {
    pub id: Uuid,
    pub job_type: String,
    pub table: String,
    pub status: JobStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub error: Option<String>,
}

impl AsyncJob {
    pub fn new(job_type: impl Into<String>, table: impl Into<String>, now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.into(),
            table: table.into(),
            status: JobStatus::Pending,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }
}
