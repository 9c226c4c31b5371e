use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::value::Value;

/// `(index_name, key_value)` identifies an entry; `shard_ids` is the
/// non-empty sorted set of logical shards holding at least one row with that
/// key. An entry is removed outright rather than ever stored with an empty
/// set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualIndexEntry {
    pub index_name: String,
    pub key_value: String,
    pub shard_ids: BTreeSet<usize>,
}

/// Canonicalize one or more indexed-column values into the string key used
/// throughout Topology. Single-column keys are `String(value)`;
/// multi-column keys are `JSON(array of column values)`. Any NULL in the
/// tuple means the row is never indexed (§3 VirtualIndexEntry invariant).
pub fn canonical_key(values: &[Value]) -> Option<String> {
    if values.iter().any(Value::is_null) {
        return None;
    }

    Some(match values {
        [single] => single.to_canonical_string(),
        many => {
            let array: Vec<Json> = many.iter().map(Value::to_json).collect();
            Json::Array(array).to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_key_is_bare_string() {
        assert_eq!(canonical_key(&[Value::Integer(7)]), Some("7".to_string()));
    }

    #[test]
    fn test_composite_key_is_json_array() {
        let key = canonical_key(&[Value::Integer(7), Value::Text("a".into())]).unwrap();
        assert_eq!(key, "[7,\"a\"]");
    }

    #[test]
    fn test_any_null_suppresses_indexing() {
        assert_eq!(canonical_key(&[Value::Integer(7), Value::Null]), None);
        assert_eq!(canonical_key(&[Value::Null]), None);
    }
}
