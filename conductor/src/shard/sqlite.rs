use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection;

use super::convert::{value_from_ref, SqlValue};
use super::{Error, Result, Row, ShardResponse, StorageShard};
use crate::value::Value;

/// One SQLite connection per configured node, executed inside a blocking
/// task since `rusqlite` is synchronous (§6.2, §10.1).
pub struct SqliteShard {
    connections: HashMap<String, Arc<Mutex<Connection>>>,
}

impl SqliteShard {
    pub fn open(nodes: &[(String, PathBuf)]) -> Result<Self> {
        let mut connections = HashMap::with_capacity(nodes.len());
        for (id, path) in nodes {
            let conn = Connection::open(path).map_err(|source| Error::Open {
                node: id.clone(),
                path: path.display().to_string(),
                source,
            })?;
            connections.insert(id.clone(), Arc::new(Mutex::new(conn)));
        }
        Ok(Self { connections })
    }

    /// Opens one transient in-memory SQLite connection per node id. Used by
    /// unit tests throughout this crate and by integration tests that need
    /// a full `Conductor` without touching the filesystem.
    pub fn open_in_memory(node_ids: &[&str]) -> Self {
        let connections = node_ids
            .iter()
            .map(|id| {
                (
                    id.to_string(),
                    Arc::new(Mutex::new(Connection::open_in_memory().unwrap())),
                )
            })
            .collect();
        Self { connections }
    }
}

#[async_trait]
impl StorageShard for SqliteShard {
    async fn execute(&self, node_id: &str, sql: &str, params: &[Value]) -> Result<ShardResponse> {
        let conn = self
            .connections
            .get(node_id)
            .ok_or_else(|| Error::UnknownNode(node_id.to_string()))?
            .clone();
        let node = node_id.to_string();
        let sql = sql.to_string();
        let params = params.to_vec();

        tokio::task::spawn_blocking(move || run(&conn, &node, &sql, &params))
            .await
            .map_err(|_| Error::WorkerPanicked(node_id.to_string()))?
    }
}

fn run(conn: &Mutex<Connection>, node: &str, sql: &str, params: &[Value]) -> Result<ShardResponse> {
    let conn = conn.lock();
    let bound: Vec<SqlValue<'_>> = params.iter().map(SqlValue).collect();
    let refs: Vec<&dyn rusqlite::ToSql> =
        bound.iter().map(|v| v as &dyn rusqlite::ToSql).collect();

    let mut stmt = conn
        .prepare(sql)
        .map_err(|source| into_sqlite_error(node, source))?;

    if stmt.column_count() == 0 {
        let affected = stmt
            .execute(refs.as_slice())
            .map_err(|source| into_sqlite_error(node, source))?;
        return Ok(ShardResponse { rows: vec![], rows_affected: affected });
    }

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map(refs.as_slice(), |row| {
            let mut out = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                out.insert(name.clone(), value_from_ref(row.get_ref(i)?));
            }
            Ok(out)
        })
        .map_err(|source| into_sqlite_error(node, source))?
        .collect::<rusqlite::Result<Vec<Row>>>()
        .map_err(|source| into_sqlite_error(node, source))?;

    let rows_affected = rows.len();
    Ok(ShardResponse { rows, rows_affected })
}

fn into_sqlite_error(node: &str, source: rusqlite::Error) -> Error {
    Error::Sqlite { node: node.to_string(), source }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_insert_select_round_trip() {
        let shard = SqliteShard::open_in_memory(&["n1"]);

        shard
            .execute("n1", "CREATE TABLE t (id INTEGER, name TEXT)", &[])
            .await
            .unwrap();

        let write = shard
            .execute(
                "n1",
                "INSERT INTO t (id, name) VALUES (?, ?)",
                &[Value::Integer(1), Value::Text("a".into())],
            )
            .await
            .unwrap();
        assert_eq!(write.rows_affected, 1);

        let read = shard.execute("n1", "SELECT id, name FROM t", &[]).await.unwrap();
        assert_eq!(read.rows.len(), 1);
        assert_eq!(read.rows[0]["id"], Value::Integer(1));
        assert_eq!(read.rows[0]["name"], Value::Text("a".into()));
    }

    #[tokio::test]
    async fn test_unknown_node_errors() {
        let shard = SqliteShard::open_in_memory(&["n1"]);
        let err = shard.execute("missing", "SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, Error::UnknownNode(_)));
    }
}
