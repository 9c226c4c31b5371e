//! Topology: the cluster metadata catalog. Owns the storage-node roster,
//! table metadata, the logical→physical shard map, virtual secondary-index
//! definitions and entries, and the async-job log. The single mutator and
//! single source of truth for all of the above (§3 "Ownership").

mod async_job;
mod error;
mod node;
mod snapshot;
mod store;
mod table;
mod virtual_index;
mod virtual_index_entry;

pub use async_job::{AsyncJob, JobStatus};
pub use error::{Error, Result};
pub use node::{NodeStatus, StorageNode};
pub use snapshot::TopologySnapshot;
pub use store::{DeltaOp, InMemoryTopology, TopologyDelta, TopologyStore};
pub use table::{Table, TableShardAssignment, HASH_ALGORITHM_VERSION};
pub use virtual_index::{IndexStatus, IndexType, VirtualIndex};
pub use virtual_index_entry::{canonical_key, VirtualIndexEntry};
