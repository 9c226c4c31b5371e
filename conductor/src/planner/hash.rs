//! The router's hash function (§4.4). Recorded as
//! [`crate::topology::HASH_ALGORITHM_VERSION`] on table metadata so a future
//! change to it cannot silently remigrate data without the version bumping
//! alongside it.

/// Stable string-fold hash over UTF-16 code units, matching the
/// key-canonicalization rule used for virtual-index entries: values are
/// stringified with [`crate::value::Value::to_canonical_string`] before
/// hashing.
pub fn fold_hash(value: &str) -> u32 {
    let mut h: i64 = 0;
    for unit in value.encode_utf16() {
        h = ((h << 5) - h + unit as i64) & 0xFFFF_FFFF;
    }
    h.unsigned_abs() as u32
}

/// `hash(value) mod num_shards`, the shared rule used by both INSERT routing
/// and `shard_key = ?` routing so the same row always lands on the same
/// shard regardless of which statement wrote it.
pub fn shard_for(value: &str, num_shards: usize) -> usize {
    debug_assert!(num_shards > 0);
    (fold_hash(value) as usize) % num_shards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        assert_eq!(fold_hash("alice@example.com"), fold_hash("alice@example.com"));
    }

    #[test]
    fn test_shard_for_is_stable_across_calls() {
        let a = shard_for("100", 4);
        let b = shard_for("100", 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shard_for_within_bounds() {
        for v in ["1", "2", "3", "alice", "bob", ""] {
            assert!(shard_for(v, 5) < 5);
        }
    }
}
