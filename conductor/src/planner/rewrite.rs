//! Statement rewriting: the resharding `_virtualShard` filter (§4.4) and the
//! `CREATE TABLE` column/PK augmentation every table gets so its physical
//! primary key is `(_virtualShard, pk_columns...)` (§3 Table invariant).

use crate::parser::{
    ColumnConstraint, ColumnDef, CreateTableStatement, Expr, TableConstraint,
};

pub const VIRTUAL_SHARD_COLUMN: &str = "_virtualShard";

/// Conjoin `AND _virtualShard = ?` onto an existing WHERE (or set
/// `WHERE _virtualShard = ?` if there was none). The new placeholder is
/// appended at `next_index`, never renumbering an existing one (§9 Design
/// Notes, "parameter tracking").
pub fn conjoin_virtual_shard_filter(where_clause: Option<Expr>, next_index: usize) -> Expr {
    let filter = Expr::BinaryOp {
        left: Box::new(Expr::Identifier(crate::parser::Identifier {
            qualifier: None,
            name: VIRTUAL_SHARD_COLUMN.to_string(),
        })),
        op: crate::parser::BinaryOp::Eq,
        right: Box::new(Expr::Placeholder(next_index)),
    };
    match where_clause {
        Some(existing) => Expr::And(Box::new(existing), Box::new(filter)),
        None => filter,
    }
}

/// Augment a `CREATE TABLE` with the injected `_virtualShard INTEGER NOT
/// NULL DEFAULT 0` column, demoting any single-column or table-level
/// PRIMARY KEY into a composite `(_virtualShard, original_pk_cols...)`.
pub fn augment_create_table(stmt: &CreateTableStatement) -> CreateTableStatement {
    let mut columns: Vec<ColumnDef> = Vec::with_capacity(stmt.columns.len() + 1);
    let mut pk_columns: Vec<String> = Vec::new();

    for col in &stmt.columns {
        if col.is_primary_key() {
            pk_columns.push(col.name.clone());
            columns.push(ColumnDef {
                name: col.name.clone(),
                data_type: col.data_type.clone(),
                constraints: col
                    .constraints
                    .iter()
                    .filter(|c| **c != ColumnConstraint::PrimaryKey)
                    .cloned()
                    .collect(),
            });
        } else {
            columns.push(col.clone());
        }
    }

    let mut table_constraints = Vec::new();
    for constraint in &stmt.table_constraints {
        match constraint {
            TableConstraint::PrimaryKey(cols) => pk_columns.extend(cols.iter().cloned()),
        }
    }

    let mut full_pk = vec![VIRTUAL_SHARD_COLUMN.to_string()];
    full_pk.extend(pk_columns);
    table_constraints.push(TableConstraint::PrimaryKey(full_pk));

    columns.push(ColumnDef {
        name: VIRTUAL_SHARD_COLUMN.to_string(),
        data_type: "INTEGER".to_string(),
        constraints: vec![
            ColumnConstraint::NotNull,
            ColumnConstraint::Default(Expr::Literal(crate::parser::Literal::Number("0".to_string()))),
        ],
    });

    CreateTableStatement {
        if_not_exists: stmt.if_not_exists,
        name: stmt.name.clone(),
        columns,
        table_constraints,
    }
}
