use serde::{Deserialize, Serialize};

/// Settings that govern the router itself rather than any single table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct General {
    /// Maximum number of shard RPCs the Executor runs concurrently in a single
    /// fan-out batch. The default of 7 exists to honor external subrequest
    /// ceilings, not because of anything intrinsic to the router.
    ///
    /// _Default:_ `7`
    #[serde(default = "General::parallelism")]
    pub parallelism: usize,

    /// Timeout applied to every shard RPC, in milliseconds.
    ///
    /// _Default:_ `5000`
    #[serde(default = "General::shard_timeout_ms")]
    pub shard_timeout_ms: u64,

    /// Maximum number of maintenance messages the index consumer pulls off
    /// the queue per batch.
    ///
    /// _Default:_ `10`
    #[serde(default = "General::queue_batch_size")]
    pub queue_batch_size: usize,

    /// Number of times the transport retries a failed maintenance job before
    /// sending it to the dead-letter sink.
    ///
    /// _Default:_ `3`
    #[serde(default = "General::queue_max_retries")]
    pub queue_max_retries: usize,

    /// How long a cached Topology snapshot may be served before a caller
    /// must re-fetch it, in milliseconds. Independent of the version-based
    /// invalidation a DDL/index-status change triggers immediately.
    ///
    /// _Default:_ `1000`
    #[serde(default = "General::topology_cache_ttl_ms")]
    pub topology_cache_ttl_ms: u64,
}

impl General {
    fn parallelism() -> usize {
        7
    }

    fn shard_timeout_ms() -> u64 {
        5000
    }

    fn queue_batch_size() -> usize {
        10
    }

    fn queue_max_retries() -> usize {
        3
    }

    fn topology_cache_ttl_ms() -> u64 {
        1000
    }
}

impl Default for General {
    fn default() -> Self {
        Self {
            parallelism: Self::parallelism(),
            shard_timeout_ms: Self::shard_timeout_ms(),
            queue_batch_size: Self::queue_batch_size(),
            queue_max_retries: Self::queue_max_retries(),
            topology_cache_ttl_ms: Self::topology_cache_ttl_ms(),
        }
    }
}
