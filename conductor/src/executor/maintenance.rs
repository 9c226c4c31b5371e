//! Index-maintenance event construction (§4.5): every `INSERT` / `UPDATE` /
//! `DELETE` against a table with virtual indexes (ready, building, or
//! rebuilding — all three still need to stay consistent) produces a batch
//! of [`IndexDelta`]s the queue applies to the index-entry catalog.

use std::collections::BTreeSet;

use crate::parser::{BinaryOp, Identifier, Literal, Expr, SelectItem, SelectStatement, Statement, TableRef};
use crate::planner::ShardStatement;
use crate::shard::{Row, StorageShard};
use crate::topology::{canonical_key, DeltaOp, VirtualIndex};
use crate::value::Value;

use super::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct IndexDelta {
    pub index_name: String,
    pub shard_id: usize,
    pub key_value: String,
    pub op: DeltaOp,
}

/// Deltas an already-planned `INSERT` produces. Every inserted value is
/// already resolved in `stmt.params`, so no capture round-trip is needed
/// (unlike `UPDATE`/`DELETE`, where prior values must be read back).
pub fn insert_deltas(indexes: &[VirtualIndex], statements: &[ShardStatement]) -> Vec<IndexDelta> {
    let mut deltas = Vec::new();
    for stmt in statements {
        let Statement::Insert(insert) = &stmt.statement else { continue };
        let row_width = insert.columns.len();
        if row_width == 0 {
            continue;
        }
        for index in indexes_coverable_by(indexes, &insert.columns) {
            let positions: Vec<usize> = index
                .columns
                .iter()
                .map(|c| insert.columns.iter().position(|ic| ic.eq_ignore_ascii_case(c)).unwrap())
                .collect();
            for row_values in stmt.params.chunks(row_width) {
                let key_values: Vec<Value> = positions.iter().map(|&p| row_values[p].clone()).collect();
                if let Some(key) = canonical_key(&key_values) {
                    deltas.push(IndexDelta {
                        index_name: index.name.clone(),
                        shard_id: stmt.target.shard_id,
                        key_value: key,
                        op: DeltaOp::Add,
                    });
                }
            }
        }
    }
    deltas
}

fn indexes_coverable_by<'a>(indexes: &'a [VirtualIndex], columns: &[String]) -> Vec<&'a VirtualIndex> {
    indexes
        .iter()
        .filter(|idx| idx.columns.iter().all(|c| columns.iter().any(|ic| ic.eq_ignore_ascii_case(c))))
        .collect()
}

/// A `SELECT <indexed columns> FROM table WHERE <same filter>` used to
/// capture the values a `DELETE`/`UPDATE` is about to invalidate, reusing
/// the exact per-shard WHERE the write itself carries.
pub fn capture_statement(table: &str, columns: &[String], where_clause: Option<&Expr>) -> SelectStatement {
    SelectStatement {
        select_list: columns
            .iter()
            .map(|c| SelectItem::Expr {
                expr: Expr::Identifier(crate::parser::Identifier { qualifier: None, name: c.clone() }),
                alias: None,
            })
            .collect(),
        from: Some(TableRef { name: table.to_string(), alias: None }),
        where_clause: where_clause.cloned(),
        ..Default::default()
    }
}

pub fn where_clause_of(stmt: &Statement) -> Option<&Expr> {
    match stmt {
        Statement::Update(u) => u.where_clause.as_ref(),
        Statement::Delete(d) => d.where_clause.as_ref(),
        _ => None,
    }
}

/// The subset of `params` a WHERE clause lifted out of its statement needs
/// to bind against, in the textual order its `?` tokens will appear in —
/// *not* the original statement's full parameter vector, which also carries
/// placeholders from clauses the lifted WHERE doesn't include (e.g. an
/// `UPDATE`'s `SET` assignments). Reusing the full vector binds values to
/// the wrong placeholders whenever those clauses interleave (§4.5 batched
/// capture).
pub fn where_params(where_clause: Option<&Expr>, params: &[Value]) -> Result<Vec<Value>> {
    let Some(where_clause) = where_clause else { return Ok(Vec::new()) };
    where_clause
        .placeholder_indices()
        .into_iter()
        .map(|idx| params.get(idx).cloned().ok_or(Error::ParamOutOfRange(idx)))
        .collect()
}

/// Projects a shard's result rows down to `columns`' values, in that order.
pub fn project_rows(rows: &[Row], columns: &[String]) -> Vec<Vec<Value>> {
    rows.iter()
        .map(|row| columns.iter().map(|c| row.get(c).cloned().unwrap_or(Value::Null)).collect())
        .collect()
}

/// Deltas for a captured-then-deleted row set: every captured row's key is
/// removed from every index it fed.
pub fn delete_deltas(
    indexes: &[VirtualIndex],
    shard_id: usize,
    captured_columns: &[String],
    captured_rows: &[Vec<Value>],
) -> Vec<IndexDelta> {
    let mut deltas = Vec::new();
    for index in indexes_coverable_by(indexes, captured_columns) {
        let positions: Vec<usize> = index
            .columns
            .iter()
            .map(|c| captured_columns.iter().position(|ic| ic.eq_ignore_ascii_case(c)).unwrap())
            .collect();
        for row in captured_rows {
            let key_values: Vec<Value> = positions.iter().map(|&p| row[p].clone()).collect();
            if let Some(key) = canonical_key(&key_values) {
                deltas.push(IndexDelta { index_name: index.name.clone(), shard_id, key_value: key, op: DeltaOp::Remove });
            }
        }
    }
    deltas
}

/// Deltas for a captured-then-updated row set (§4.5). The new value of each
/// indexed column is read back with a second, post-write capture rather
/// than resolved from the `SET` assignments, so it is exact even when an
/// assignment isn't a literal or a bound parameter (e.g. `price = price *
/// 1.1`, which no amount of static resolution can evaluate).
///
/// A key whose membership among the *touched* rows is unchanged emits
/// nothing. For a key that does change, whether a `remove`/`add` is
/// actually emitted is decided by [`exists_elsewhere`]: a row the WHERE
/// clause didn't touch is unaffected by the write, so if one already
/// carries the old (resp. new) key, this shard's membership for that key
/// must already be (resp. remain) intact regardless of what happened to the
/// touched rows — this is what keeps an UPDATE of one of several same-key
/// rows on a shard from wrongly dropping the key's membership (§8 property
/// 3, scenario S7).
pub async fn update_deltas(
    shard: &dyn StorageShard,
    node_id: &str,
    table: &str,
    indexes: &[VirtualIndex],
    shard_id: usize,
    captured_columns: &[String],
    before_rows: &[Vec<Value>],
    where_clause: Option<&Expr>,
    where_params: &[Value],
) -> std::result::Result<Vec<IndexDelta>, crate::shard::Error> {
    let after = shard
        .execute(node_id, &capture_statement(table, captured_columns, where_clause).to_string(), where_params)
        .await?;
    let after_rows = project_rows(&after.rows, captured_columns);

    let mut deltas = Vec::new();
    for index in indexes_coverable_by(indexes, captured_columns) {
        let positions: Vec<usize> = index
            .columns
            .iter()
            .map(|c| captured_columns.iter().position(|ic| ic.eq_ignore_ascii_case(c)).unwrap())
            .collect();

        let old_keys = distinct_keys(before_rows, &positions);
        let new_keys = distinct_keys(&after_rows, &positions);

        for (key, values) in &old_keys {
            if new_keys.iter().any(|(k, _)| k == key) {
                continue;
            }
            if !exists_elsewhere(shard, node_id, table, &index.columns, values, where_clause, where_params).await? {
                deltas.push(IndexDelta { index_name: index.name.clone(), shard_id, key_value: key.clone(), op: DeltaOp::Remove });
            }
        }
        for (key, values) in &new_keys {
            if old_keys.iter().any(|(k, _)| k == key) {
                continue;
            }
            if !exists_elsewhere(shard, node_id, table, &index.columns, values, where_clause, where_params).await? {
                deltas.push(IndexDelta { index_name: index.name.clone(), shard_id, key_value: key.clone(), op: DeltaOp::Add });
            }
        }
    }
    Ok(deltas)
}

/// Distinct `(canonical key, component values)` pairs among `rows`'
/// `positions` columns, first-occurrence order, skipping rows with a NULL
/// in the tuple (never indexed, §3).
fn distinct_keys(rows: &[Vec<Value>], positions: &[usize]) -> Vec<(String, Vec<Value>)> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for row in rows {
        let values: Vec<Value> = positions.iter().map(|&p| row[p].clone()).collect();
        if let Some(key) = canonical_key(&values) {
            if seen.insert(key.clone()) {
                out.push((key, values));
            }
        }
    }
    out
}

/// Whether a row this write's WHERE clause did *not* match already carries
/// `key_values` for `index_columns`, on this same shard. Such a row is
/// unaffected by the write, so checking it once, after the write runs,
/// answers both "does this shard still have the old key" (for a candidate
/// `remove`) and "did this shard already have the new key" (for a candidate
/// `add`).
async fn exists_elsewhere(
    shard: &dyn StorageShard,
    node_id: &str,
    table: &str,
    index_columns: &[String],
    key_values: &[Value],
    where_clause: Option<&Expr>,
    where_params: &[Value],
) -> std::result::Result<bool, crate::shard::Error> {
    let Some(where_clause) = where_clause else {
        // No WHERE: every row on this shard was touched by the write, so
        // there is no untouched row left to still (or already) carry the key.
        return Ok(false);
    };

    let mut params = Vec::with_capacity(key_values.len() + where_params.len());
    let mut key_expr: Option<Expr> = None;
    for (column, value) in index_columns.iter().zip(key_values) {
        let eq = Expr::BinaryOp {
            left: Box::new(Expr::Identifier(Identifier { qualifier: None, name: column.clone() })),
            op: BinaryOp::Eq,
            right: Box::new(Expr::Placeholder(params.len())),
        };
        params.push(value.clone());
        key_expr = Some(match key_expr {
            Some(existing) => Expr::And(Box::new(existing), Box::new(eq)),
            None => eq,
        });
    }
    params.extend(where_params.iter().cloned());

    let filter = Expr::And(
        Box::new(Expr::Paren(Box::new(key_expr.expect("index has at least one column")))),
        Box::new(Expr::Not(Box::new(Expr::Paren(Box::new(where_clause.clone()))))),
    );
    let select = SelectStatement {
        select_list: vec![SelectItem::Expr { expr: Expr::Literal(Literal::Number("1".to_string())), alias: None }],
        from: Some(TableRef { name: table.to_string(), alias: None }),
        where_clause: Some(filter),
        limit: Some(Expr::Literal(Literal::Number("1".to_string()))),
        ..Default::default()
    };

    let response = shard.execute(node_id, &select.to_string(), &params).await?;
    Ok(!response.rows.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Identifier, Literal};
    use crate::planner::ShardTarget;
    use crate::topology::IndexType;

    fn index(name: &str, table: &str, cols: &[&str]) -> VirtualIndex {
        VirtualIndex::new(name, table, cols.iter().map(|s| s.to_string()).collect(), IndexType::Hash)
    }

    #[test]
    fn test_insert_deltas_skip_rows_with_null_key() {
        let indexes = vec![index("by_email", "users", &["email"])];
        let statements = vec![ShardStatement {
            target: ShardTarget { shard_id: 0, node_id: "n1".into() },
            statement: Statement::Insert(crate::parser::InsertStatement {
                table: "users".into(),
                columns: vec!["id".into(), "email".into()],
                rows: vec![vec![Expr::Placeholder(0), Expr::Placeholder(1)]],
            }),
            params: vec![Value::Integer(1), Value::Null],
        }];
        let deltas = insert_deltas(&indexes, &statements);
        assert!(deltas.is_empty());
    }

    #[test]
    fn test_insert_deltas_built_for_matching_index() {
        let indexes = vec![index("by_email", "users", &["email"])];
        let statements = vec![ShardStatement {
            target: ShardTarget { shard_id: 2, node_id: "n1".into() },
            statement: Statement::Insert(crate::parser::InsertStatement {
                table: "users".into(),
                columns: vec!["id".into(), "email".into()],
                rows: vec![vec![Expr::Placeholder(0), Expr::Placeholder(1)]],
            }),
            params: vec![Value::Integer(1), Value::Text("a@example.com".into())],
        }];
        let deltas = insert_deltas(&indexes, &statements);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].shard_id, 2);
        assert_eq!(deltas[0].op, DeltaOp::Add);
    }

    async fn users_shard() -> crate::shard::SqliteShard {
        let shard = crate::shard::SqliteShard::open_in_memory(&["n1"]);
        shard
            .execute("n1", "CREATE TABLE users (id INTEGER, email TEXT, other_col INTEGER)", &[])
            .await
            .unwrap();
        shard
    }

    fn where_id_eq() -> Expr {
        Expr::BinaryOp {
            left: Box::new(Expr::Identifier(Identifier { qualifier: None, name: "id".into() })),
            op: crate::parser::BinaryOp::Eq,
            right: Box::new(Expr::Placeholder(0)),
        }
    }

    #[tokio::test]
    async fn test_update_deltas_emit_remove_and_add_on_key_change() {
        let shard = users_shard().await;
        shard.execute("n1", "INSERT INTO users (id, email) VALUES (1, 'old@example.com')", &[]).await.unwrap();

        let indexes = vec![index("by_email", "users", &["email"])];
        let captured_columns = vec!["email".to_string()];
        let before_rows = vec![vec![Value::Text("old@example.com".into())]];
        let where_clause = where_id_eq();

        shard.execute("n1", "UPDATE users SET email = 'new@example.com' WHERE id = ?", &[Value::Integer(1)]).await.unwrap();

        let deltas = update_deltas(
            &shard,
            "n1",
            "users",
            &indexes,
            0,
            &captured_columns,
            &before_rows,
            Some(&where_clause),
            &[Value::Integer(1)],
        )
        .await
        .unwrap();
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].op, DeltaOp::Remove);
        assert_eq!(deltas[1].op, DeltaOp::Add);
    }

    #[tokio::test]
    async fn test_update_deltas_skip_unchanged_key() {
        let shard = users_shard().await;
        shard.execute("n1", "INSERT INTO users (id, email) VALUES (1, 'same@example.com')", &[]).await.unwrap();

        let indexes = vec![index("by_email", "users", &["email"])];
        let captured_columns = vec!["email".to_string()];
        let before_rows = vec![vec![Value::Text("same@example.com".into())]];
        let where_clause = where_id_eq();

        shard.execute("n1", "UPDATE users SET other_col = 1 WHERE id = ?", &[Value::Integer(1)]).await.unwrap();

        let deltas = update_deltas(
            &shard,
            "n1",
            "users",
            &indexes,
            0,
            &captured_columns,
            &before_rows,
            Some(&where_clause),
            &[Value::Integer(1)],
        )
        .await
        .unwrap();
        assert!(deltas.is_empty());
    }

    /// Two rows on the same shard share an indexed key; only one is touched
    /// by the UPDATE. The untouched row still carries the old key, so no
    /// `Remove` should be emitted for it (§8 property 3).
    #[tokio::test]
    async fn test_update_deltas_keeps_key_when_sibling_row_still_carries_it() {
        let shard = users_shard().await;
        shard.execute("n1", "INSERT INTO users (id, email) VALUES (1, 'shared@example.com')", &[]).await.unwrap();
        shard.execute("n1", "INSERT INTO users (id, email) VALUES (2, 'shared@example.com')", &[]).await.unwrap();

        let indexes = vec![index("by_email", "users", &["email"])];
        let captured_columns = vec!["email".to_string()];
        let before_rows = vec![vec![Value::Text("shared@example.com".into())]];
        let where_clause = where_id_eq();

        shard.execute("n1", "UPDATE users SET email = 'new@example.com' WHERE id = ?", &[Value::Integer(1)]).await.unwrap();

        let deltas = update_deltas(
            &shard,
            "n1",
            "users",
            &indexes,
            0,
            &captured_columns,
            &before_rows,
            Some(&where_clause),
            &[Value::Integer(1)],
        )
        .await
        .unwrap();
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].op, DeltaOp::Add);
        assert_eq!(deltas[0].key_value, "new@example.com");
    }

    #[test]
    fn test_capture_statement_reuses_where_clause() {
        let where_clause = Expr::BinaryOp {
            left: Box::new(Expr::Identifier(Identifier { qualifier: None, name: "id".into() })),
            op: crate::parser::BinaryOp::Eq,
            right: Box::new(Expr::Placeholder(0)),
        };
        let select = capture_statement("users", &["email".to_string()], Some(&where_clause));
        assert_eq!(select.to_string(), "SELECT email FROM users WHERE id = ?");
    }
}
