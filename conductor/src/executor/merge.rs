//! Combines per-shard [`ShardResponse`]s into the single result set a
//! caller sees, per the strategy the planner attached to the plan (§4.5).

use std::cmp::Ordering;

use crate::planner::{AggregateKind, ColumnMerge, SelectMergeStrategy, VIRTUAL_SHARD_COLUMN};
use crate::shard::{Row, ShardResponse};
use crate::value::Value;

pub fn merge_select(strategy: &SelectMergeStrategy, responses: Vec<ShardResponse>) -> Vec<Row> {
    match strategy {
        SelectMergeStrategy::Union { strip_virtual_shard } => merge_union(*strip_virtual_shard, responses),
        SelectMergeStrategy::Aggregate { columns } => {
            let rows: Vec<Row> = responses.into_iter().flat_map(|r| r.rows).collect();
            vec![reduce_rows(&rows, columns)]
        }
        SelectMergeStrategy::GroupBy { group_by_fields, columns } => {
            merge_group_by(group_by_fields, columns, responses)
        }
        SelectMergeStrategy::UnmergeableGroupBy => merge_union(false, responses),
    }
}

fn merge_union(strip_virtual_shard: bool, responses: Vec<ShardResponse>) -> Vec<Row> {
    responses
        .into_iter()
        .flat_map(|r| r.rows)
        .map(|mut row| {
            if strip_virtual_shard {
                row.shift_remove(VIRTUAL_SHARD_COLUMN);
            }
            row
        })
        .collect()
}

fn merge_group_by(
    group_by_fields: &[String],
    columns: &[(String, ColumnMerge)],
    responses: Vec<ShardResponse>,
) -> Vec<Row> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<Row>> = std::collections::HashMap::new();

    for response in responses {
        for row in response.rows {
            let key = group_key(group_by_fields, &row);
            groups.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                Vec::new()
            }).push(row);
        }
    }

    order
        .into_iter()
        .map(|key| reduce_rows(&groups.remove(&key).unwrap_or_default(), columns))
        .collect()
}

fn group_key(group_by_fields: &[String], row: &Row) -> String {
    group_by_fields
        .iter()
        .map(|f| row.get(f).map(Value::to_canonical_string).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\u{1}")
}

/// Reduce a set of per-shard rows belonging to the same group (or the
/// whole result set, for an ungrouped aggregate) into one output row.
fn reduce_rows(rows: &[Row], columns: &[(String, ColumnMerge)]) -> Row {
    let mut out = Row::new();
    for (name, merge) in columns {
        let value = match merge {
            ColumnMerge::PassThrough => rows
                .first()
                .and_then(|r| r.get(name))
                .cloned()
                .unwrap_or(Value::Null),
            ColumnMerge::Aggregate(kind) => combine_aggregate(*kind, name, rows, columns),
        };
        out.insert(name.clone(), value);
    }
    out
}

fn combine_aggregate(kind: AggregateKind, name: &str, rows: &[Row], columns: &[(String, ColumnMerge)]) -> Value {
    let values: Vec<&Value> = rows.iter().filter_map(|r| r.get(name)).collect();

    match kind {
        AggregateKind::Count => {
            let total: i64 = values.iter().filter_map(|v| as_f64(v)).map(|f| f as i64).sum();
            Value::Integer(total)
        }
        AggregateKind::Sum => {
            let non_null: Vec<f64> = values.iter().filter(|v| !v.is_null()).filter_map(|v| as_f64(v)).collect();
            if non_null.is_empty() {
                Value::Null
            } else {
                Value::Real(non_null.iter().sum())
            }
        }
        AggregateKind::Min => extreme(&values, Ordering::Less),
        AggregateKind::Max => extreme(&values, Ordering::Greater),
        AggregateKind::Avg => combine_avg(name, rows, columns),
    }
}

/// Exact recombination when a paired `COUNT` column sits in the same
/// select list: weight each shard's average by its row count rather than
/// averaging the per-shard averages unweighted (which is only correct
/// when every shard contributed the same number of rows).
fn combine_avg(name: &str, rows: &[Row], columns: &[(String, ColumnMerge)]) -> Value {
    let count_column = columns
        .iter()
        .find(|(_, merge)| matches!(merge, ColumnMerge::Aggregate(AggregateKind::Count)))
        .map(|(n, _)| n.as_str());

    if let Some(count_column) = count_column {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for row in rows {
            let (Some(avg), Some(weight)) = (
                row.get(name).and_then(as_f64),
                row.get(count_column).and_then(as_f64),
            ) else {
                continue;
            };
            weighted_sum += avg * weight;
            total_weight += weight;
        }
        return if total_weight == 0.0 {
            Value::Null
        } else {
            Value::Real(weighted_sum / total_weight)
        };
    }

    let non_null: Vec<f64> = rows.iter().filter_map(|r| r.get(name)).filter_map(as_f64).collect();
    if non_null.is_empty() {
        Value::Null
    } else {
        Value::Real(non_null.iter().sum::<f64>() / non_null.len() as f64)
    }
}

fn extreme(values: &[&Value], want: Ordering) -> Value {
    values
        .iter()
        .filter(|v| !v.is_null())
        .fold(None::<&Value>, |acc, v| match acc {
            None => Some(v),
            Some(best) if value_cmp(v, best) == want => Some(v),
            Some(best) => Some(best),
        })
        .cloned()
        .unwrap_or(Value::Null)
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Integer(i) => Some(*i as f64),
        Value::Real(r) => Some(*r),
        Value::Boolean(b) => Some(*b as i64 as f64),
        _ => None,
    }
}

fn value_cmp(a: &Value, b: &Value) -> Ordering {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_canonical_string().cmp(&b.to_canonical_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_union_strips_virtual_shard_by_default() {
        let responses = vec![ShardResponse {
            rows: vec![row(&[("id", Value::Integer(1)), (VIRTUAL_SHARD_COLUMN, Value::Integer(0))])],
            rows_affected: 1,
        }];
        let merged = merge_select(&SelectMergeStrategy::Union { strip_virtual_shard: true }, responses);
        assert!(!merged[0].contains_key(VIRTUAL_SHARD_COLUMN));
    }

    #[test]
    fn test_sum_across_shards() {
        let columns = vec![("total".to_string(), ColumnMerge::Aggregate(AggregateKind::Sum))];
        let responses = vec![
            ShardResponse { rows: vec![row(&[("total", Value::Integer(3))])], rows_affected: 1 },
            ShardResponse { rows: vec![row(&[("total", Value::Integer(4))])], rows_affected: 1 },
        ];
        let merged = merge_select(&SelectMergeStrategy::Aggregate { columns }, responses);
        assert_eq!(merged[0]["total"], Value::Real(7.0));
    }

    #[test]
    fn test_avg_weighted_by_paired_count() {
        let columns = vec![
            ("n".to_string(), ColumnMerge::Aggregate(AggregateKind::Count)),
            ("avg_age".to_string(), ColumnMerge::Aggregate(AggregateKind::Avg)),
        ];
        let responses = vec![
            ShardResponse {
                rows: vec![row(&[("n", Value::Integer(1)), ("avg_age", Value::Real(10.0))])],
                rows_affected: 1,
            },
            ShardResponse {
                rows: vec![row(&[("n", Value::Integer(3)), ("avg_age", Value::Real(20.0))])],
                rows_affected: 1,
            },
        ];
        let merged = merge_select(&SelectMergeStrategy::Aggregate { columns }, responses);
        // (1*10 + 3*20) / 4 = 17.5
        assert_eq!(merged[0]["avg_age"], Value::Real(17.5));
    }

    #[test]
    fn test_group_by_reduces_within_group_across_shards() {
        let columns = vec![
            ("dept".to_string(), ColumnMerge::PassThrough),
            ("n".to_string(), ColumnMerge::Aggregate(AggregateKind::Count)),
        ];
        let responses = vec![
            ShardResponse {
                rows: vec![row(&[("dept", Value::Text("eng".into())), ("n", Value::Integer(2))])],
                rows_affected: 1,
            },
            ShardResponse {
                rows: vec![row(&[("dept", Value::Text("eng".into())), ("n", Value::Integer(5))])],
                rows_affected: 1,
            },
        ];
        let merged = merge_select(
            &SelectMergeStrategy::GroupBy { group_by_fields: vec!["dept".to_string()], columns },
            responses,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0]["n"], Value::Integer(7));
    }

    #[test]
    fn test_max_ignores_nulls() {
        let columns = vec![("top".to_string(), ColumnMerge::Aggregate(AggregateKind::Max))];
        let responses = vec![
            ShardResponse { rows: vec![row(&[("top", Value::Null)])], rows_affected: 1 },
            ShardResponse { rows: vec![row(&[("top", Value::Integer(9))])], rows_affected: 1 },
        ];
        let merged = merge_select(&SelectMergeStrategy::Aggregate { columns }, responses);
        assert_eq!(merged[0]["top"], Value::Integer(9));
    }
}
