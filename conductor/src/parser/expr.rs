use std::fmt;

use super::ast::SelectStatement;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Literal::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Literal::Null => write!(f, "NULL"),
        }
    }
}

/// A column reference. May contain at most one dot (`table.column` or
/// `alias.column`).
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub qualifier: Option<String>,
    pub name: String,
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{q}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Like,
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Like => "LIKE",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{s}")
    }
}

/// Every accepted expression node. Each placeholder is tagged with its
/// *source* position (the order in which `?` appeared in the original SQL),
/// not a running count at planning/rewrite time — rewrites that inject
/// additional placeholders must append rather than renumber.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Placeholder(usize),
    Identifier(Identifier),
    FunctionCall {
        name: String,
        args: Vec<Expr>,
        distinct: bool,
    },
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<SelectStatement>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        low: Box<Expr>,
        high: Box<Expr>,
        negated: bool,
    },
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    Case {
        operand: Option<Box<Expr>>,
        whens: Vec<(Expr, Expr)>,
        else_: Option<Box<Expr>>,
    },
    Subquery(Box<SelectStatement>),
    Paren(Box<Expr>),
}

impl Expr {
    /// Number of distinct placeholder slots a query needs, i.e. one past the
    /// highest source index seen anywhere in the statement. Used when
    /// appending a new placeholder during rewriting (§4.4).
    pub fn max_placeholder_index(&self) -> Option<usize> {
        let mut max = None;
        self.walk_placeholders(&mut |idx| {
            max = Some(max.map_or(idx, |m: usize| m.max(idx)));
        });
        max
    }

    /// Source indices of every placeholder in this expression, in the order
    /// they appear in `Display` output (i.e. the order their `?` tokens will
    /// be positionally bound when this expression is embedded in rendered
    /// SQL). Used to carve out the parameter subset a sub-expression (e.g. a
    /// WHERE clause lifted into a standalone capture `SELECT`) needs to bind
    /// against, independent of the full statement's parameter vector.
    pub fn placeholder_indices(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.walk_placeholders(&mut |idx| out.push(idx));
        out
    }

    fn walk_placeholders(&self, f: &mut impl FnMut(usize)) {
        match self {
            Expr::Placeholder(idx) => f(*idx),
            Expr::Literal(_) | Expr::Identifier(_) => {}
            Expr::FunctionCall { args, .. } => args.iter().for_each(|a| a.walk_placeholders(f)),
            Expr::BinaryOp { left, right, .. } => {
                left.walk_placeholders(f);
                right.walk_placeholders(f);
            }
            Expr::Not(e) | Expr::Paren(e) => e.walk_placeholders(f),
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.walk_placeholders(f);
                r.walk_placeholders(f);
            }
            Expr::InList { expr, list, .. } => {
                expr.walk_placeholders(f);
                list.iter().for_each(|e| e.walk_placeholders(f));
            }
            Expr::InSubquery { expr, .. } => expr.walk_placeholders(f),
            Expr::Between {
                expr, low, high, ..
            } => {
                expr.walk_placeholders(f);
                low.walk_placeholders(f);
                high.walk_placeholders(f);
            }
            Expr::IsNull { expr, .. } => expr.walk_placeholders(f),
            Expr::Case {
                operand,
                whens,
                else_,
            } => {
                if let Some(operand) = operand {
                    operand.walk_placeholders(f);
                }
                for (when, then) in whens {
                    when.walk_placeholders(f);
                    then.walk_placeholders(f);
                }
                if let Some(else_) = else_ {
                    else_.walk_placeholders(f);
                }
            }
            Expr::Subquery(_) => {}
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(l) => write!(f, "{l}"),
            Expr::Placeholder(_) => write!(f, "?"),
            Expr::Identifier(id) => write!(f, "{id}"),
            Expr::FunctionCall {
                name,
                args,
                distinct,
            } => {
                write!(f, "{name}(")?;
                if *distinct {
                    write!(f, "DISTINCT ")?;
                }
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
            Expr::BinaryOp { left, op, right } => write!(f, "{left} {op} {right}"),
            Expr::Not(e) => write!(f, "NOT {e}"),
            Expr::And(l, r) => write!(f, "{l} AND {r}"),
            Expr::Or(l, r) => write!(f, "{l} OR {r}"),
            Expr::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{expr} ")?;
                if *negated {
                    write!(f, "NOT ")?;
                }
                write!(f, "IN (")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                write!(f, "{expr} ")?;
                if *negated {
                    write!(f, "NOT ")?;
                }
                write!(f, "IN ({subquery})")
            }
            Expr::Between {
                expr,
                low,
                high,
                negated,
            } => {
                write!(f, "{expr} ")?;
                if *negated {
                    write!(f, "NOT ")?;
                }
                write!(f, "BETWEEN {low} AND {high}")
            }
            Expr::IsNull { expr, negated } => {
                write!(f, "{expr} IS ")?;
                if *negated {
                    write!(f, "NOT ")?;
                }
                write!(f, "NULL")
            }
            Expr::Case {
                operand,
                whens,
                else_,
            } => {
                write!(f, "CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                for (when, then) in whens {
                    write!(f, " WHEN {when} THEN {then}")?;
                }
                if let Some(else_) = else_ {
                    write!(f, " ELSE {else_}")?;
                }
                write!(f, " END")
            }
            Expr::Subquery(s) => write!(f, "({s})"),
            Expr::Paren(e) => write!(f, "({e})"),
        }
    }
}
