use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// A bound parameter or a row's column value. Shared between the parameter
/// vector accepted by [`crate::Conductor::query`], the storage-shard
/// interface (§6.2), and Topology's index-entry canonicalization (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `String(v)` per §4.4's hash rule and §3's key-canonicalization rule:
    /// the same stringification is used whether hashing for shard routing
    /// or building an index key.
    pub fn to_canonical_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(b) => hex_encode(b),
            Value::Boolean(b) => b.to_string(),
        }
    }

    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Integer(i) => Json::from(*i),
            Value::Real(r) => serde_json::Number::from_f64(*r)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Text(s) => Json::String(s.clone()),
            Value::Blob(b) => Json::String(hex_encode(b)),
            Value::Boolean(b) => Json::Bool(*b),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_matches_across_types() {
        assert_eq!(Value::Integer(42).to_canonical_string(), "42");
        assert_eq!(Value::Text("x".into()).to_canonical_string(), "x");
    }
}
