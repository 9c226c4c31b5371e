use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;

use crate::value::Value;

/// Bridges [`Value`] (the router's own bound-parameter/row-value type) to
/// and from `rusqlite`'s wire representation, since SQLite itself is the
/// black-box RDBMS behind the storage-shard boundary (§1).
pub struct SqlValue<'a>(pub &'a Value);

impl ToSql for SqlValue<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self.0 {
            Value::Null => ToSqlOutput::from(rusqlite::types::Null),
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(r) => ToSqlOutput::from(*r),
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
            Value::Boolean(b) => ToSqlOutput::from(*b as i64),
        })
    }
}

pub fn value_from_ref(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean_round_trips_through_integer() {
        let sql = SqlValue(&Value::Boolean(true)).to_sql().unwrap();
        assert!(matches!(sql, ToSqlOutput::Owned(rusqlite::types::Value::Integer(1))));
    }
}
