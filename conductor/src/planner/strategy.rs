//! Classifies a `SELECT` into the merge strategy the Executor/Merger (§4.5)
//! should apply to its per-shard results. Planning-time classification keeps
//! the Merger itself dumb: it never re-inspects the AST, only the tag
//! produced here plus the rows it gets back.

use crate::parser::{Expr, SelectItem, SelectStatement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl AggregateKind {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "COUNT" => Some(Self::Count),
            "SUM" => Some(Self::Sum),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "AVG" => Some(Self::Avg),
            _ => None,
        }
    }
}

/// How a single output column (keyed by the name the shard returns it
/// under) must be combined across shards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMerge {
    /// An ordinary column or GROUP BY key: pass the first row's value
    /// through unchanged.
    PassThrough,
    Aggregate(AggregateKind),
}

/// The merge strategy attached to a planned `SELECT` (§4.5).
#[derive(Debug, Clone, PartialEq)]
pub enum SelectMergeStrategy {
    /// No aggregation, no GROUP BY: concatenate shard rows in shard order,
    /// stripping `_virtualShard` unless it was explicitly projected.
    Union { strip_virtual_shard: bool },
    /// Aggregation with no GROUP BY: reduce every shard's single row into
    /// one using `columns`.
    Aggregate { columns: Vec<(String, ColumnMerge)> },
    /// GROUP BY whose columns are all projected: multimap by the group key,
    /// then reduce within each group using `columns`.
    GroupBy {
        group_by_fields: Vec<String>,
        columns: Vec<(String, ColumnMerge)>,
    },
    /// GROUP BY whose columns are not all projected: not safely mergeable;
    /// return the raw union of shard rows.
    UnmergeableGroupBy,
}

/// The default name SQLite assigns an unaliased result column: the column
/// name for a bare identifier, the literal source text otherwise. Mirrors
/// real SQLite naming closely enough for this router's own rewritten
/// statements (documented approximation, see DESIGN.md).
fn default_field_name(expr: &Expr) -> String {
    match expr {
        Expr::Identifier(id) => id.name.clone(),
        other => other.to_string(),
    }
}

fn field_name(item: &SelectItem) -> Option<String> {
    match item {
        SelectItem::Star => None,
        SelectItem::Expr { expr, alias } => {
            Some(alias.clone().unwrap_or_else(|| default_field_name(expr)))
        }
    }
}

fn classify_item(item: &SelectItem) -> Option<(String, ColumnMerge)> {
    let name = field_name(item)?;
    let merge = match item {
        SelectItem::Expr {
            expr: Expr::FunctionCall { name: fn_name, .. },
            ..
        } => AggregateKind::from_name(fn_name)
            .map(ColumnMerge::Aggregate)
            .unwrap_or(ColumnMerge::PassThrough),
        _ => ColumnMerge::PassThrough,
    };
    Some((name, merge))
}

/// Determine the merge strategy for a planned `SELECT` (§4.5).
pub fn classify(select: &SelectStatement) -> SelectMergeStrategy {
    let columns: Vec<(String, ColumnMerge)> = select.select_list.iter().filter_map(classify_item).collect();
    let has_aggregation = columns
        .iter()
        .any(|(_, merge)| matches!(merge, ColumnMerge::Aggregate(_)));

    if select.group_by.is_empty() {
        if has_aggregation {
            SelectMergeStrategy::Aggregate { columns }
        } else {
            let strip_virtual_shard = !select
                .select_list
                .iter()
                .any(|item| matches!(field_name(item), Some(name) if name.eq_ignore_ascii_case("_virtualShard")));
            SelectMergeStrategy::Union { strip_virtual_shard }
        }
    } else {
        let group_by_fields: Vec<String> = select.group_by.iter().map(default_field_name).collect();
        let all_projected = group_by_fields
            .iter()
            .all(|g| columns.iter().any(|(name, _)| name == g));
        if all_projected {
            SelectMergeStrategy::GroupBy {
                group_by_fields,
                columns,
            }
        } else {
            SelectMergeStrategy::UnmergeableGroupBy
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, Statement};

    fn select(sql: &str) -> SelectStatement {
        match parse(sql).unwrap() {
            Statement::Select(s) => s,
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_plain_select_is_union_stripping_virtual_shard() {
        let strategy = classify(&select("SELECT id, email FROM users"));
        assert_eq!(
            strategy,
            SelectMergeStrategy::Union {
                strip_virtual_shard: true
            }
        );
    }

    #[test]
    fn test_explicit_virtual_shard_projection_keeps_it() {
        let strategy = classify(&select("SELECT id, _virtualShard FROM users"));
        assert_eq!(
            strategy,
            SelectMergeStrategy::Union {
                strip_virtual_shard: false
            }
        );
    }

    #[test]
    fn test_aggregate_no_group_by() {
        let strategy = classify(&select("SELECT COUNT(*), AVG(age) FROM users"));
        match strategy {
            SelectMergeStrategy::Aggregate { columns } => {
                assert_eq!(columns[0].1, ColumnMerge::Aggregate(AggregateKind::Count));
                assert_eq!(columns[1].1, ColumnMerge::Aggregate(AggregateKind::Avg));
            }
            other => panic!("expected Aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_group_by_projected() {
        let strategy = classify(&select("SELECT dept, COUNT(*) FROM users GROUP BY dept"));
        match strategy {
            SelectMergeStrategy::GroupBy { group_by_fields, .. } => {
                assert_eq!(group_by_fields, vec!["dept".to_string()]);
            }
            other => panic!("expected GroupBy, got {other:?}"),
        }
    }

    #[test]
    fn test_group_by_not_projected_is_unmergeable() {
        let strategy = classify(&select("SELECT COUNT(*) FROM users GROUP BY dept"));
        assert_eq!(strategy, SelectMergeStrategy::UnmergeableGroupBy);
    }
}
