//! Fans a [`Plan`] out to its shard targets with bounded concurrency,
//! merges the responses per its [`MergeStrategy`], and derives the
//! index-maintenance deltas an indexed write produces (§4.5, §6).

mod error;
mod maintenance;
mod merge;

pub use error::{Error, Result};
pub use maintenance::IndexDelta;

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::parser::Statement;
use crate::planner::{MergeStrategy, Plan, ShardStatement};
use crate::shard::{Row, ShardResponse, StorageShard};
use crate::topology::{TopologySnapshot, VirtualIndex};
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct ExecutionOutcome {
    pub rows: Vec<Row>,
    pub rows_affected: usize,
    pub index_deltas: Vec<IndexDelta>,
}

pub struct Executor {
    shard: Arc<dyn StorageShard>,
    parallelism: usize,
}

impl Executor {
    pub fn new(shard: Arc<dyn StorageShard>, parallelism: usize) -> Self {
        Self { shard, parallelism: parallelism.max(1) }
    }

    pub async fn execute(&self, plan: &Plan, snapshot: &TopologySnapshot) -> Result<ExecutionOutcome> {
        match &plan.merge {
            MergeStrategy::Ddl => self.execute_ddl(plan).await,
            MergeStrategy::CreateIndex(_) => Ok(ExecutionOutcome::default()),
            MergeStrategy::Write => self.execute_write(plan, snapshot).await,
            MergeStrategy::Select(strategy) => {
                let responses = self.fan_out(&plan.shard_statements).await?;
                Ok(ExecutionOutcome { rows: merge::merge_select(strategy, responses), ..Default::default() })
            }
        }
    }

    async fn execute_ddl(&self, plan: &Plan) -> Result<ExecutionOutcome> {
        let responses = self.fan_out(&plan.shard_statements).await?;
        Ok(ExecutionOutcome {
            rows_affected: responses.iter().map(|r| r.rows_affected).sum(),
            ..Default::default()
        })
    }

    async fn execute_write(&self, plan: &Plan, snapshot: &TopologySnapshot) -> Result<ExecutionOutcome> {
        let table = plan.shard_statements.first().and_then(|s| s.statement.table_name().map(str::to_string));
        let indexes: Vec<VirtualIndex> = match &table {
            Some(t) => snapshot.virtual_indexes.iter().filter(|i| &i.table == t).cloned().collect(),
            None => Vec::new(),
        };

        if indexes.is_empty() {
            let responses = self.fan_out(&plan.shard_statements).await?;
            return Ok(ExecutionOutcome {
                rows_affected: responses.iter().map(|r| r.rows_affected).sum(),
                ..Default::default()
            });
        }

        if matches!(plan.shard_statements.first().map(|s| &s.statement), Some(Statement::Insert(_))) {
            let responses = self.fan_out(&plan.shard_statements).await?;
            let index_deltas = maintenance::insert_deltas(&indexes, &plan.shard_statements);
            return Ok(ExecutionOutcome {
                rows_affected: responses.iter().map(|r| r.rows_affected).sum(),
                index_deltas,
                ..Default::default()
            });
        }

        self.execute_captured_write(plan, &indexes).await
    }

    /// `UPDATE`/`DELETE` against an indexed table: read back the indexed
    /// columns for every row the WHERE clause matches before running the
    /// write, since those values are about to disappear or change.
    async fn execute_captured_write(&self, plan: &Plan, indexes: &[VirtualIndex]) -> Result<ExecutionOutcome> {
        let captured_columns: Vec<String> = indexes
            .iter()
            .flat_map(|i| i.columns.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut rows_affected = 0;
        let mut index_deltas = Vec::new();

        for stmt in &plan.shard_statements {
            let where_clause = maintenance::where_clause_of(&stmt.statement);
            let table = stmt.statement.table_name().unwrap_or_default().to_string();
            let where_params = maintenance::where_params(where_clause, &stmt.params)?;
            let capture = maintenance::capture_statement(&table, &captured_columns, where_clause);
            let captured = self
                .shard
                .execute(&stmt.target.node_id, &capture.to_string(), &where_params)
                .await
                .map_err(Error::from)?;
            let before_rows = maintenance::project_rows(&captured.rows, &captured_columns);

            let response = self.run_one(stmt).await?;
            rows_affected += response.rows_affected;

            match &stmt.statement {
                Statement::Delete(_) => {
                    index_deltas.extend(maintenance::delete_deltas(indexes, stmt.target.shard_id, &captured_columns, &before_rows));
                }
                Statement::Update(_) => {
                    index_deltas.extend(
                        maintenance::update_deltas(
                            &*self.shard,
                            &stmt.target.node_id,
                            &table,
                            indexes,
                            stmt.target.shard_id,
                            &captured_columns,
                            &before_rows,
                            where_clause,
                            &where_params,
                        )
                        .await
                        .map_err(Error::from)?,
                    );
                }
                _ => {}
            }
        }

        Ok(ExecutionOutcome { rows_affected, index_deltas, ..Default::default() })
    }

    async fn fan_out(&self, statements: &[ShardStatement]) -> Result<Vec<ShardResponse>> {
        tracing::debug!(targets = statements.len(), parallelism = self.parallelism, "fanning out to shards");
        let mut out = Vec::with_capacity(statements.len());
        for batch in statements.chunks(self.parallelism) {
            let results = futures::future::join_all(batch.iter().map(|s| self.run_one(s))).await;
            for result in results {
                out.push(result?);
            }
        }
        Ok(out)
    }

    async fn run_one(&self, stmt: &ShardStatement) -> Result<ShardResponse> {
        self.shard
            .execute(&stmt.target.node_id, &stmt.statement.to_string(), &stmt.params)
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::planner::Planner;
    use crate::shard::SqliteShard;
    use crate::topology::{IndexType, StorageNode, Table, TableShardAssignment, TopologySnapshot, VirtualIndex};

    fn snapshot_with_one_shard(table_name: &str) -> TopologySnapshot {
        TopologySnapshot {
            nodes: vec![StorageNode::new("n1")],
            tables: vec![Table::new(table_name, "id", 1)],
            table_shards: vec![TableShardAssignment { table_name: table_name.to_string(), shard_id: 0, node_id: "n1".into() }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_execute_write_insert_without_indexes() {
        let shard = Arc::new(SqliteShard::open_in_memory(&["n1"]));
        shard.execute("n1", "CREATE TABLE users (id INTEGER, email TEXT)", &[]).await.unwrap();

        let executor = Executor::new(shard, 7);
        let snapshot = snapshot_with_one_shard("users");

        let plan = Planner::plan(&parse("INSERT INTO users (id, email) VALUES (?, ?)").unwrap(), &[Value::Integer(1), Value::Text("a@example.com".into())], &snapshot).unwrap();
        let outcome = executor.execute(&plan, &snapshot).await.unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert!(outcome.index_deltas.is_empty());
    }

    #[tokio::test]
    async fn test_execute_write_insert_with_index_emits_deltas() {
        let shard = Arc::new(SqliteShard::open_in_memory(&["n1"]));
        shard.execute("n1", "CREATE TABLE users (id INTEGER, email TEXT)", &[]).await.unwrap();

        let executor = Executor::new(shard, 7);
        let mut snapshot = snapshot_with_one_shard("users");
        snapshot.virtual_indexes.push(VirtualIndex::new("by_email", "users", vec!["email".to_string()], IndexType::Hash));

        let plan = Planner::plan(&parse("INSERT INTO users (id, email) VALUES (?, ?)").unwrap(), &[Value::Integer(1), Value::Text("a@example.com".into())], &snapshot).unwrap();
        let outcome = executor.execute(&plan, &snapshot).await.unwrap();
        assert_eq!(outcome.index_deltas.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_select_union() {
        let shard = Arc::new(SqliteShard::open_in_memory(&["n1"]));
        shard.execute("n1", "CREATE TABLE users (id INTEGER, email TEXT)", &[]).await.unwrap();
        shard.execute("n1", "INSERT INTO users (id, email) VALUES (1, 'a@example.com')", &[]).await.unwrap();

        let executor = Executor::new(shard, 7);
        let snapshot = snapshot_with_one_shard("users");
        let plan = Planner::plan(&parse("SELECT id, email FROM users").unwrap(), &[], &snapshot).unwrap();
        let outcome = executor.execute(&plan, &snapshot).await.unwrap();
        assert_eq!(outcome.rows.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_delete_with_index_emits_remove_delta() {
        let shard = Arc::new(SqliteShard::open_in_memory(&["n1"]));
        shard.execute("n1", "CREATE TABLE users (id INTEGER, email TEXT)", &[]).await.unwrap();
        shard.execute("n1", "INSERT INTO users (id, email) VALUES (1, 'a@example.com')", &[]).await.unwrap();

        let executor = Executor::new(shard, 7);
        let mut snapshot = snapshot_with_one_shard("users");
        snapshot.virtual_indexes.push(VirtualIndex::new("by_email", "users", vec!["email".to_string()], IndexType::Hash));

        let plan = Planner::plan(&parse("DELETE FROM users WHERE id = ?").unwrap(), &[Value::Integer(1)], &snapshot).unwrap();
        let outcome = executor.execute(&plan, &snapshot).await.unwrap();
        assert_eq!(outcome.rows_affected, 1);
        assert_eq!(outcome.index_deltas.len(), 1);
        assert_eq!(outcome.index_deltas[0].op, crate::topology::DeltaOp::Remove);
    }
}
