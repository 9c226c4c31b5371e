//! The Planner (§4.4): from a parsed statement, a parameter vector and a
//! Topology snapshot, decide the minimal shard set, optionally consult the
//! virtual secondary-index catalog, and produce the rewritten per-shard
//! statement(s) plus a merge strategy for the Executor/Merger.

mod error;
mod extract;
mod hash;
mod rewrite;
mod strategy;
mod where_clause;

pub use error::{Error, Result};
pub use extract::resolve_value;
pub use hash::{fold_hash, shard_for};
pub use rewrite::VIRTUAL_SHARD_COLUMN;
pub use strategy::{AggregateKind, ColumnMerge, SelectMergeStrategy};

use crate::parser::{
    AlterTableStatement, CreateIndexStatement, CreateTableStatement, DeleteStatement,
    DropTableStatement, Expr, InsertStatement, PragmaStatement, SelectStatement, Statement,
    UpdateStatement,
};
use crate::topology::{canonical_key, IndexType, TopologySnapshot};
use crate::value::Value;

/// One shard this statement must run on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardTarget {
    pub shard_id: usize,
    pub node_id: String,
}

/// A statement plus its own parameter vector, ready to send to one shard.
/// Statements differ across shards only when the planner split an INSERT's
/// rows by shard or injected a resharding `_virtualShard` filter.
#[derive(Debug, Clone)]
pub struct ShardStatement {
    pub target: ShardTarget,
    pub statement: Statement,
    pub params: Vec<Value>,
}

/// A virtual index the planner has determined should be (re)registered with
/// Topology. Carried separately from `shard_statements` because `CREATE
/// INDEX` never issues physical SQL to a shard (§9: physical per-shard
/// indexes are a non-goal) — it only mutates the catalog and enqueues a
/// `build_index` job.
#[derive(Debug, Clone)]
pub struct PendingIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub index_type: IndexType,
    pub if_not_exists: bool,
}

/// The merging strategy the Executor/Merger should apply to this plan's
/// per-shard results (§4.5).
#[derive(Debug, Clone)]
pub enum MergeStrategy {
    /// `CREATE TABLE` / `DROP TABLE` / `ALTER TABLE`: fan out to every node
    /// hosting the table, all must succeed, no row merging.
    Ddl,
    /// `CREATE INDEX`: no shard fan-out at all.
    CreateIndex(PendingIndex),
    /// `INSERT` / `UPDATE` / `DELETE`: sum `rowsAffected`, empty rows.
    Write,
    Select(SelectMergeStrategy),
}

#[derive(Debug, Clone)]
pub struct Plan {
    pub shard_statements: Vec<ShardStatement>,
    pub merge: MergeStrategy,
}

pub struct Planner;

impl Planner {
    pub fn plan(statement: &Statement, params: &[Value], snapshot: &TopologySnapshot) -> Result<Plan> {
        match statement {
            Statement::CreateTable(s) => Self::plan_create_table(s, snapshot),
            Statement::DropTable(s) => Self::plan_drop_table(s, snapshot),
            Statement::AlterTable(s) => Self::plan_alter_table(s, snapshot),
            Statement::CreateIndex(s) => Self::plan_create_index(s),
            Statement::Insert(s) => Self::plan_insert(s, params, snapshot),
            Statement::Select(s) => Self::plan_select(s, params, snapshot),
            Statement::Update(s) => Self::plan_update(s, params, snapshot),
            Statement::Delete(s) => Self::plan_delete(s, params, snapshot),
            Statement::Pragma(s) => Self::plan_pragma(s, snapshot),
        }
    }

    fn plan_create_table(stmt: &CreateTableStatement, snapshot: &TopologySnapshot) -> Result<Plan> {
        let augmented = rewrite::augment_create_table(stmt);
        let shard_statements = snapshot
            .nodes
            .iter()
            .filter(|n| n.is_active())
            .enumerate()
            .map(|(i, node)| ShardStatement {
                target: ShardTarget {
                    shard_id: i,
                    node_id: node.id.clone(),
                },
                statement: Statement::CreateTable(augmented.clone()),
                params: Vec::new(),
            })
            .collect();
        Ok(Plan {
            shard_statements,
            merge: MergeStrategy::Ddl,
        })
    }

    fn plan_drop_table(stmt: &DropTableStatement, snapshot: &TopologySnapshot) -> Result<Plan> {
        if snapshot.table(&stmt.name).is_none() {
            if stmt.if_exists {
                return Ok(Plan {
                    shard_statements: Vec::new(),
                    merge: MergeStrategy::Ddl,
                });
            }
            return Err(Error::UnknownTable(stmt.name.clone()));
        }
        let shard_statements = Self::fan_out_to_table_nodes(&stmt.name, snapshot, Statement::DropTable(stmt.clone()))?;
        Ok(Plan {
            shard_statements,
            merge: MergeStrategy::Ddl,
        })
    }

    fn plan_alter_table(stmt: &AlterTableStatement, snapshot: &TopologySnapshot) -> Result<Plan> {
        if snapshot.table(&stmt.table).is_none() {
            return Err(Error::UnknownTable(stmt.table.clone()));
        }
        let shard_statements = Self::fan_out_to_table_nodes(&stmt.table, snapshot, Statement::AlterTable(stmt.clone()))?;
        Ok(Plan {
            shard_statements,
            merge: MergeStrategy::Ddl,
        })
    }

    fn plan_create_index(stmt: &CreateIndexStatement) -> Result<Plan> {
        let index_type = if stmt.unique { IndexType::Unique } else { IndexType::Hash };
        Ok(Plan {
            shard_statements: Vec::new(),
            merge: MergeStrategy::CreateIndex(PendingIndex {
                name: stmt.name.clone(),
                table: stmt.table.clone(),
                columns: stmt.columns.clone(),
                index_type,
                if_not_exists: stmt.if_not_exists,
            }),
        })
    }

    fn plan_pragma(_stmt: &PragmaStatement, snapshot: &TopologySnapshot) -> Result<Plan> {
        let shard_statements = snapshot
            .nodes
            .iter()
            .filter(|n| n.is_active())
            .enumerate()
            .map(|(i, node)| ShardStatement {
                target: ShardTarget {
                    shard_id: i,
                    node_id: node.id.clone(),
                },
                statement: Statement::Pragma(_stmt.clone()),
                params: Vec::new(),
            })
            .collect();
        Ok(Plan {
            shard_statements,
            merge: MergeStrategy::Ddl,
        })
    }

    /// One `ShardStatement` per distinct node hosting a shard of `table`,
    /// carrying the unmodified statement (no params: DDL never binds `?`).
    fn fan_out_to_table_nodes(table: &str, snapshot: &TopologySnapshot, statement: Statement) -> Result<Vec<ShardStatement>> {
        let shards = snapshot.shards_of(table);
        if shards.is_empty() {
            return Err(Error::NoShardsForTable(table.to_string()));
        }
        let mut seen_nodes = std::collections::HashSet::new();
        let mut out = Vec::new();
        for shard in shards {
            if seen_nodes.insert(shard.node_id.clone()) {
                out.push(ShardStatement {
                    target: ShardTarget {
                        shard_id: shard.shard_id,
                        node_id: shard.node_id.clone(),
                    },
                    statement: statement.clone(),
                    params: Vec::new(),
                });
            }
        }
        Ok(out)
    }

    fn plan_insert(stmt: &InsertStatement, params: &[Value], snapshot: &TopologySnapshot) -> Result<Plan> {
        let table = snapshot
            .table(&stmt.table)
            .ok_or_else(|| Error::UnknownTable(stmt.table.clone()))?;

        let shard_key_idx = stmt
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&table.shard_key_column))
            .ok_or_else(|| Error::MissingShardKey {
                table: table.name.clone(),
                shard_key: table.shard_key_column.clone(),
            })?;

        let shards = snapshot.shards_of(&table.name);
        if shards.is_empty() {
            return Err(Error::NoShardsForTable(table.name.clone()));
        }

        // Preserve row order within each shard bucket; shard buckets
        // themselves are emitted in first-seen order for determinism.
        let mut buckets: Vec<(usize, Vec<&Vec<Expr>>)> = Vec::new();
        for row in &stmt.rows {
            let key_value = extract::resolve_value(&row[shard_key_idx], params)?;
            let shard_id = hash::shard_for(&key_value.to_canonical_string(), table.num_shards);
            match buckets.iter_mut().find(|(id, _)| *id == shard_id) {
                Some((_, rows)) => rows.push(row),
                None => buckets.push((shard_id, vec![row])),
            }
        }

        let mut columns = stmt.columns.clone();
        if table.resharding {
            columns.push(rewrite::VIRTUAL_SHARD_COLUMN.to_string());
        }

        let mut shard_statements = Vec::with_capacity(buckets.len());
        for (shard_id, rows) in buckets {
            let target = shards
                .iter()
                .find(|s| s.shard_id == shard_id)
                .map(|s| ShardTarget {
                    shard_id: s.shard_id,
                    node_id: s.node_id.clone(),
                })
                .ok_or_else(|| Error::NoShardsForTable(table.name.clone()))?;

            let mut fresh_params = Vec::new();
            let mut fresh_rows = Vec::with_capacity(rows.len());
            for row in rows {
                let mut fresh_row = Vec::with_capacity(columns.len());
                for expr in row {
                    let value = extract::resolve_value(expr, params)?;
                    fresh_row.push(Expr::Placeholder(fresh_params.len()));
                    fresh_params.push(value);
                }
                if table.resharding {
                    fresh_row.push(Expr::Placeholder(fresh_params.len()));
                    fresh_params.push(Value::Integer(shard_id as i64));
                }
                fresh_rows.push(fresh_row);
            }

            shard_statements.push(ShardStatement {
                target,
                statement: Statement::Insert(InsertStatement {
                    table: table.name.clone(),
                    columns: columns.clone(),
                    rows: fresh_rows,
                }),
                params: fresh_params,
            });
        }

        Ok(Plan {
            shard_statements,
            merge: MergeStrategy::Write,
        })
    }

    fn plan_select(stmt: &SelectStatement, params: &[Value], snapshot: &TopologySnapshot) -> Result<Plan> {
        let table_ref = stmt.from.as_ref().ok_or(Error::MissingFromClause)?;
        let (targets, where_clause) = Self::route_read_or_write(&table_ref.name, stmt.where_clause.as_ref(), params, snapshot)?;

        let mut select = stmt.clone();
        let merge = MergeStrategy::Select(strategy::classify(&select));

        let table = snapshot.table(&table_ref.name).expect("checked by route_read_or_write");
        let shard_statements = Self::build_shard_statements(targets, where_clause, params, table.resharding, |w| {
            select.where_clause = w;
            Statement::Select(select.clone())
        });

        Ok(Plan { shard_statements, merge })
    }

    fn plan_update(stmt: &UpdateStatement, params: &[Value], snapshot: &TopologySnapshot) -> Result<Plan> {
        let (targets, where_clause) = Self::route_read_or_write(&stmt.table, stmt.where_clause.as_ref(), params, snapshot)?;
        let table = snapshot.table(&stmt.table).expect("checked by route_read_or_write");
        let mut update = stmt.clone();
        let shard_statements = Self::build_shard_statements(targets, where_clause, params, table.resharding, |w| {
            update.where_clause = w;
            Statement::Update(update.clone())
        });
        Ok(Plan {
            shard_statements,
            merge: MergeStrategy::Write,
        })
    }

    fn plan_delete(stmt: &DeleteStatement, params: &[Value], snapshot: &TopologySnapshot) -> Result<Plan> {
        let (targets, where_clause) = Self::route_read_or_write(&stmt.table, stmt.where_clause.as_ref(), params, snapshot)?;
        let table = snapshot.table(&stmt.table).expect("checked by route_read_or_write");
        let mut delete = stmt.clone();
        let shard_statements = Self::build_shard_statements(targets, where_clause, params, table.resharding, |w| {
            delete.where_clause = w;
            Statement::Delete(delete.clone())
        });
        Ok(Plan {
            shard_statements,
            merge: MergeStrategy::Write,
        })
    }

    /// Shared routing logic for SELECT/UPDATE/DELETE (§4.4 rules 3-5):
    /// shard-key equality, then a ready hash index, then all shards.
    /// Returns the resolved shard targets and the (untouched) WHERE clause.
    fn route_read_or_write<'a>(
        table_name: &str,
        where_clause: Option<&'a Expr>,
        params: &[Value],
        snapshot: &TopologySnapshot,
    ) -> Result<(Vec<ShardTarget>, Option<&'a Expr>)> {
        let table = snapshot
            .table(table_name)
            .ok_or_else(|| Error::UnknownTable(table_name.to_string()))?;
        let shards = snapshot.shards_of(table_name);
        if shards.is_empty() {
            return Err(Error::NoShardsForTable(table_name.to_string()));
        }

        let conjuncts = where_clause.map(where_clause::top_level_conjuncts).unwrap_or_default();

        if let Some(expr) = where_clause::find_column_equality(&conjuncts, &table.shard_key_column) {
            if let Ok(value) = extract::resolve_value(expr, params) {
                let shard_id = hash::shard_for(&value.to_canonical_string(), table.num_shards);
                let target = shards
                    .iter()
                    .find(|s| s.shard_id == shard_id)
                    .map(|s| ShardTarget {
                        shard_id: s.shard_id,
                        node_id: s.node_id.clone(),
                    });
                if let Some(target) = target {
                    return Ok((vec![target], where_clause));
                }
            }
        }

        for index in snapshot.virtual_indexes.iter().filter(|i| i.table == table_name && i.is_ready() && i.columns.len() == 1) {
            if let Some(expr) = where_clause::find_column_equality(&conjuncts, &index.columns[0]) {
                if let Ok(value) = extract::resolve_value(expr, params) {
                    let key = canonical_key(&[value]);
                    let shard_ids = match key {
                        Some(k) => snapshot.indexed_shards(&index.name, &k),
                        None => Vec::new(),
                    };
                    let targets = shard_ids
                        .into_iter()
                        .filter_map(|id| shards.iter().find(|s| s.shard_id == id))
                        .map(|s| ShardTarget {
                            shard_id: s.shard_id,
                            node_id: s.node_id.clone(),
                        })
                        .collect();
                    return Ok((targets, where_clause));
                }
            }
        }

        let targets = shards
            .into_iter()
            .map(|s| ShardTarget {
                shard_id: s.shard_id,
                node_id: s.node_id.clone(),
            })
            .collect();
        Ok((targets, where_clause))
    }

    /// Builds one `ShardStatement` per target, conjoining a resharding
    /// `_virtualShard = ?` filter when `resharding` is set (§4.4). `build`
    /// receives the per-shard WHERE clause and returns the finished
    /// statement.
    fn build_shard_statements(
        targets: Vec<ShardTarget>,
        where_clause: Option<&Expr>,
        params: &[Value],
        resharding: bool,
        mut build: impl FnMut(Option<Expr>) -> Statement,
    ) -> Vec<ShardStatement> {
        if !resharding {
            let statement = build(where_clause.cloned());
            return targets
                .into_iter()
                .map(|target| ShardStatement {
                    target,
                    statement: statement.clone(),
                    params: params.to_vec(),
                })
                .collect();
        }

        let next_index = where_clause
            .and_then(|w| w.max_placeholder_index())
            .map(|m| m + 1)
            .unwrap_or(0);

        targets
            .into_iter()
            .map(|target| {
                let filtered = rewrite::conjoin_virtual_shard_filter(where_clause.cloned(), next_index);
                let mut shard_params = params.to_vec();
                shard_params.push(Value::Integer(target.shard_id as i64));
                ShardStatement {
                    statement: build(Some(filtered)),
                    params: shard_params,
                    target,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::topology::{InMemoryTopology, Table, TopologyDelta, TopologyStore};

    async fn topology_with_table(num_nodes: usize, table: Table) -> TopologySnapshot {
        let topo = InMemoryTopology::new();
        topo.create(num_nodes).await.unwrap();
        topo.update_topology(TopologyDelta {
            add: vec![table],
            ..Default::default()
        })
        .await
        .unwrap();
        topo.get_topology().await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_requires_shard_key_column() {
        let snap = topology_with_table(1, Table::new("users", "id", 1)).await;
        let stmt = parse("INSERT INTO users (name) VALUES (?)").unwrap();
        let err = Planner::plan(&stmt, &[Value::Text("a".into())], &snap).unwrap_err();
        assert!(matches!(err, Error::MissingShardKey { .. }));
    }

    #[tokio::test]
    async fn test_insert_routes_to_single_shard() {
        let snap = topology_with_table(2, Table::new("users", "id", 4)).await;
        let stmt = parse("INSERT INTO users (id, name) VALUES (?, ?)").unwrap();
        let params = vec![Value::Integer(100), Value::Text("alice".into())];
        let plan = Planner::plan(&stmt, &params, &snap).unwrap();
        assert_eq!(plan.shard_statements.len(), 1);
        assert!(matches!(plan.merge, MergeStrategy::Write));
    }

    #[tokio::test]
    async fn test_select_by_id_routes_single_shard() {
        let snap = topology_with_table(2, Table::new("users", "id", 1)).await;
        let stmt = parse("SELECT * FROM users WHERE id = ?").unwrap();
        let plan = Planner::plan(&stmt, &[Value::Integer(100)], &snap).unwrap();
        assert_eq!(plan.shard_statements.len(), 1);
    }

    #[tokio::test]
    async fn test_select_with_no_predicate_hits_all_shards() {
        let snap = topology_with_table(2, Table::new("users", "id", 4)).await;
        let stmt = parse("SELECT * FROM users").unwrap();
        let plan = Planner::plan(&stmt, &[], &snap).unwrap();
        assert_eq!(plan.shard_statements.len(), 4);
    }

    #[tokio::test]
    async fn test_select_shard_key_through_second_placeholder() {
        let snap = topology_with_table(2, Table::new("users", "id", 4)).await;
        let stmt = parse("SELECT * FROM users WHERE age > ? AND id = ?").unwrap();
        let plan = Planner::plan(&stmt, &[Value::Integer(20), Value::Integer(100)], &snap).unwrap();
        assert_eq!(plan.shard_statements.len(), 1);
    }

    #[tokio::test]
    async fn test_create_table_augments_and_targets_all_nodes() {
        let topo = InMemoryTopology::new();
        topo.create(3).await.unwrap();
        let snap = topo.get_topology().await.unwrap();
        let stmt = parse("CREATE TABLE users(id INTEGER PRIMARY KEY, name TEXT)").unwrap();
        let plan = Planner::plan(&stmt, &[], &snap).unwrap();
        assert_eq!(plan.shard_statements.len(), 3);
        assert!(matches!(plan.merge, MergeStrategy::Ddl));
        match &plan.shard_statements[0].statement {
            Statement::CreateTable(ct) => assert!(ct.columns.iter().any(|c| c.name == "_virtualShard")),
            _ => panic!("expected CreateTable"),
        }
    }

    #[tokio::test]
    async fn test_create_index_has_no_shard_statements() {
        let snap = topology_with_table(1, Table::new("users", "id", 1)).await;
        let stmt = parse("CREATE INDEX idx_email ON users(email)").unwrap();
        let plan = Planner::plan(&stmt, &[], &snap).unwrap();
        assert!(plan.shard_statements.is_empty());
        assert!(matches!(plan.merge, MergeStrategy::CreateIndex(_)));
    }

    #[tokio::test]
    async fn test_resharding_insert_appends_virtual_shard_column() {
        let mut table = Table::new("users", "id", 2);
        table.resharding = true;
        let snap = topology_with_table(2, table).await;
        let stmt = parse("INSERT INTO users (id, name) VALUES (?, ?)").unwrap();
        let plan = Planner::plan(&stmt, &[Value::Integer(1), Value::Text("a".into())], &snap).unwrap();
        match &plan.shard_statements[0].statement {
            Statement::Insert(i) => assert!(i.columns.contains(&"_virtualShard".to_string())),
            _ => panic!("expected insert"),
        }
    }

    #[tokio::test]
    async fn test_resharding_select_conjoins_filter_per_shard() {
        let mut table = Table::new("users", "id", 2);
        table.resharding = true;
        let snap = topology_with_table(2, table).await;
        let stmt = parse("SELECT * FROM users").unwrap();
        let plan = Planner::plan(&stmt, &[], &snap).unwrap();
        assert_eq!(plan.shard_statements.len(), 2);
        for shard_stmt in &plan.shard_statements {
            assert!(shard_stmt.statement.to_string().contains("_virtualShard = ?"));
            assert_eq!(*shard_stmt.params.last().unwrap(), Value::Integer(shard_stmt.target.shard_id as i64));
        }
    }
}
