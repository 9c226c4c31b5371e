use crate::parser::{BinaryOp, Expr};

/// Flatten the top-level `AND`-chain of a WHERE expression, stepping through
/// parentheses but never descending into an `OR`. A conjunct that is itself
/// an `Or` is kept as an opaque entry (it cannot contribute an unconditional
/// equality) rather than discarded, so sibling conjuncts are still usable.
pub fn top_level_conjuncts(expr: &Expr) -> Vec<&Expr> {
    match expr {
        Expr::And(l, r) => {
            let mut out = top_level_conjuncts(l);
            out.extend(top_level_conjuncts(r));
            out
        }
        Expr::Paren(inner) => top_level_conjuncts(inner),
        other => vec![other],
    }
}

/// Find a top-level `column = <expr>` (or `<expr> = column`) conjunct for
/// `column`, matching by unqualified name. Returns the side of the equality
/// that is not the column reference.
pub fn find_column_equality<'a>(conjuncts: &[&'a Expr], column: &str) -> Option<&'a Expr> {
    for conjunct in conjuncts {
        let Expr::BinaryOp { left, op, right } = conjunct else {
            continue;
        };
        if *op != BinaryOp::Eq {
            continue;
        }
        if is_column_ref(left, column) {
            return Some(right);
        }
        if is_column_ref(right, column) {
            return Some(left);
        }
    }
    None
}

fn is_column_ref(expr: &Expr, column: &str) -> bool {
    matches!(expr, Expr::Identifier(id) if id.name.eq_ignore_ascii_case(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, Statement};

    fn where_of(sql: &str) -> Expr {
        match parse(sql).unwrap() {
            Statement::Select(s) => s.where_clause.unwrap(),
            _ => panic!("expected select"),
        }
    }

    #[test]
    fn test_finds_equality_either_side() {
        let w = where_of("SELECT * FROM t WHERE id = ?");
        let conjuncts = top_level_conjuncts(&w);
        assert!(find_column_equality(&conjuncts, "id").is_some());

        let w = where_of("SELECT * FROM t WHERE ? = id");
        let conjuncts = top_level_conjuncts(&w);
        assert!(find_column_equality(&conjuncts, "id").is_some());
    }

    #[test]
    fn test_extracts_through_and_chain() {
        let w = where_of("SELECT * FROM t WHERE age > ? AND id = ?");
        let conjuncts = top_level_conjuncts(&w);
        let found = find_column_equality(&conjuncts, "id").unwrap();
        assert_eq!(found, &Expr::Placeholder(1));
    }

    #[test]
    fn test_does_not_extract_from_inside_or() {
        let w = where_of("SELECT * FROM t WHERE id = ? OR other = ?");
        let conjuncts = top_level_conjuncts(&w);
        assert!(find_column_equality(&conjuncts, "id").is_none());
    }

    #[test]
    fn test_sibling_of_or_is_still_usable() {
        let w = where_of("SELECT * FROM t WHERE (a = ? OR b = ?) AND id = ?");
        let conjuncts = top_level_conjuncts(&w);
        let found = find_column_equality(&conjuncts, "id").unwrap();
        assert_eq!(found, &Expr::Placeholder(2));
    }
}
