use crate::parser::{Expr, Literal};
use crate::value::Value;

use super::error::{Error, Result};

/// `Literal(...) -> Value` per the storage-shard boundary: the AST only
/// tracks the lexical shape of a literal (a bare number/string token), while
/// [`Value`] is what actually gets bound or hashed.
pub fn literal_to_value(lit: &Literal) -> Value {
    match lit {
        Literal::Null => Value::Null,
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::String(s) => Value::Text(s.clone()),
        Literal::Number(n) => {
            if let Ok(i) = n.parse::<i64>() {
                Value::Integer(i)
            } else if let Ok(f) = n.parse::<f64>() {
                Value::Real(f)
            } else {
                Value::Text(n.clone())
            }
        }
    }
}

/// Resolve an expression to a concrete [`Value`]: a literal evaluates to
/// itself, a placeholder looks up `params[placeholder.parameterIndex]`
/// (§4.4), anything else (a function call, a subquery, ...) is not a value
/// the planner can route or hash on.
pub fn resolve_value(expr: &Expr, params: &[Value]) -> Result<Value> {
    match expr {
        Expr::Literal(lit) => Ok(literal_to_value(lit)),
        Expr::Placeholder(idx) => params
            .get(*idx)
            .cloned()
            .ok_or(Error::ParamOutOfRange(*idx)),
        Expr::Paren(inner) => resolve_value(inner, params),
        other => Err(Error::UnsupportedShardKeyExpr(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_number_parses_integer_then_float() {
        assert_eq!(literal_to_value(&Literal::Number("42".into())), Value::Integer(42));
        assert_eq!(literal_to_value(&Literal::Number("4.5".into())), Value::Real(4.5));
    }

    #[test]
    fn test_resolve_placeholder_looks_up_params() {
        let params = vec![Value::Integer(1), Value::Text("x".into())];
        assert_eq!(resolve_value(&Expr::Placeholder(1), &params).unwrap(), Value::Text("x".into()));
    }

    #[test]
    fn test_resolve_placeholder_out_of_range() {
        let err = resolve_value(&Expr::Placeholder(5), &[]).unwrap_err();
        assert!(matches!(err, Error::ParamOutOfRange(5)));
    }
}
