use crate::lexer::{self, Token, TokenType};

use super::ast::*;
use super::error::Error;
use super::expr::{BinaryOp, Expr, Identifier, Literal};

/// Recursive-descent parser over a fixed token stream. Placeholders are
/// numbered in the order they're consumed, which (since the parser always
/// consumes tokens left-to-right) is exactly their source order.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    next_placeholder: usize,
}

type Result<T> = std::result::Result<T, Error>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            next_placeholder: 0,
        }
    }

    pub fn from_sql(sql: &str) -> Result<Self> {
        let tokens = lexer::lex(sql)?;
        Ok(Self::new(tokens))
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &str) -> Error {
        match self.peek() {
            Some(tok) => Error::Unexpected {
                found: tok.text.clone(),
                expected: expected.to_string(),
                offset: tok.start,
            },
            None => Error::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    /// Consume the next token if it matches `text` case-insensitively,
    /// regardless of its classified kind (keywords are matched this way).
    fn eat_keyword(&mut self, text: &str) -> bool {
        if self.peek().is_some_and(|t| t.is(text)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, text: &str) -> Result<()> {
        if self.eat_keyword(text) {
            Ok(())
        } else {
            Err(self.unexpected(text))
        }
    }

    fn eat_punct(&mut self, text: &str) -> bool {
        if self
            .peek()
            .is_some_and(|t| t.kind == TokenType::Punctuation && t.text == text)
        {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, text: &str) -> Result<()> {
        if self.eat_punct(text) {
            Ok(())
        } else {
            Err(self.unexpected(text))
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.peek() {
            Some(tok) if tok.kind == TokenType::Identifier || tok.kind == TokenType::Keyword => {
                let text = tok.text.clone();
                self.pos += 1;
                Ok(text)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Parse the single statement this token stream represents. The
    /// statement dispatch on the leading keyword is exhaustive by
    /// construction: any word falling through is reported as unsupported.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        let stmt = match self.peek() {
            Some(tok) if tok.is("SELECT") => Statement::Select(self.parse_select()?),
            Some(tok) if tok.is("INSERT") => Statement::Insert(self.parse_insert()?),
            Some(tok) if tok.is("UPDATE") => Statement::Update(self.parse_update()?),
            Some(tok) if tok.is("DELETE") => Statement::Delete(self.parse_delete()?),
            Some(tok) if tok.is("CREATE") => self.parse_create()?,
            Some(tok) if tok.is("ALTER") => Statement::AlterTable(self.parse_alter_table()?),
            Some(tok) if tok.is("DROP") => Statement::DropTable(self.parse_drop_table()?),
            Some(tok) if tok.is("PRAGMA") => Statement::Pragma(self.parse_pragma()?),
            Some(tok) => return Err(Error::UnsupportedStatement(tok.text.clone())),
            None => {
                return Err(Error::UnexpectedEof {
                    expected: "a statement".into(),
                })
            }
        };

        // Trailing `;` is tolerated but not required.
        self.eat_punct(";");

        if let Some(tok) = self.peek() {
            return Err(Error::Unexpected {
                found: tok.text.clone(),
                expected: "end of statement".into(),
                offset: tok.start,
            });
        }

        Ok(stmt)
    }

    // ---- SELECT ---------------------------------------------------------

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_keyword("SELECT")?;
        let distinct = self.eat_keyword("DISTINCT");

        let mut select_list = vec![self.parse_select_item()?];
        while self.eat_punct(",") {
            select_list.push(self.parse_select_item()?);
        }

        let mut from = None;
        let mut joins = Vec::new();
        if self.eat_keyword("FROM") {
            from = Some(self.parse_table_ref()?);
            joins = self.parse_joins()?;
        }

        let where_clause = if self.eat_keyword("WHERE") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut group_by = Vec::new();
        if self.eat_keyword("GROUP") {
            self.expect_keyword("BY")?;
            group_by.push(self.parse_expr()?);
            while self.eat_punct(",") {
                group_by.push(self.parse_expr()?);
            }
        }

        let having = if self.eat_keyword("HAVING") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let mut order_by = Vec::new();
        if self.eat_keyword("ORDER") {
            self.expect_keyword("BY")?;
            order_by.push(self.parse_order_by_item()?);
            while self.eat_punct(",") {
                order_by.push(self.parse_order_by_item()?);
            }
        }

        let limit = if self.eat_keyword("LIMIT") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let offset = if self.eat_keyword("OFFSET") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(SelectStatement {
            distinct,
            select_list,
            from,
            joins,
            where_clause,
            group_by,
            having,
            order_by,
            limit,
            offset,
        })
    }

    fn parse_select_item(&mut self) -> Result<SelectItem> {
        if self
            .peek()
            .is_some_and(|t| t.kind == TokenType::Operator && t.text == "*")
        {
            self.pos += 1;
            return Ok(SelectItem::Star);
        }

        let expr = self.parse_expr()?;
        let alias = if self.eat_keyword("AS") {
            Some(self.expect_identifier()?)
        } else if self
            .peek()
            .is_some_and(|t| t.kind == TokenType::Identifier)
        {
            Some(self.expect_identifier()?)
        } else {
            None
        };

        Ok(SelectItem::Expr { expr, alias })
    }

    fn parse_order_by_item(&mut self) -> Result<OrderByItem> {
        let expr = self.parse_expr()?;
        let desc = if self.eat_keyword("DESC") {
            true
        } else {
            self.eat_keyword("ASC");
            false
        };
        Ok(OrderByItem { expr, desc })
    }

    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let name = self.expect_identifier()?;
        let alias = if self.eat_keyword("AS") {
            Some(self.expect_identifier()?)
        } else if self
            .peek()
            .is_some_and(|t| t.kind == TokenType::Identifier)
        {
            Some(self.expect_identifier()?)
        } else {
            None
        };
        Ok(TableRef { name, alias })
    }

    fn parse_joins(&mut self) -> Result<Vec<Join>> {
        let mut joins = Vec::new();
        loop {
            let kind = if self.eat_keyword("LEFT") {
                self.eat_keyword("OUTER");
                self.expect_keyword("JOIN")?;
                JoinKind::Left
            } else if self.eat_keyword("RIGHT") {
                self.eat_keyword("OUTER");
                self.expect_keyword("JOIN")?;
                JoinKind::Right
            } else if self.eat_keyword("INNER") {
                self.expect_keyword("JOIN")?;
                JoinKind::Inner
            } else if self.eat_keyword("OUTER") {
                self.expect_keyword("JOIN")?;
                JoinKind::Outer
            } else if self.eat_keyword("JOIN") {
                JoinKind::Inner
            } else {
                break;
            };

            let table = self.parse_table_ref()?;
            let on = if self.eat_keyword("ON") {
                Some(self.parse_expr()?)
            } else {
                None
            };

            joins.push(Join { kind, table, on });
        }
        Ok(joins)
    }

    // ---- INSERT -----------------------------------------------------------

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.expect_identifier()?;

        let mut columns = Vec::new();
        if self.eat_punct("(") {
            columns.push(self.expect_identifier()?);
            while self.eat_punct(",") {
                columns.push(self.expect_identifier()?);
            }
            self.expect_punct(")")?;
        }

        self.expect_keyword("VALUES")?;

        let mut rows = vec![self.parse_value_row()?];
        while self.eat_punct(",") {
            rows.push(self.parse_value_row()?);
        }

        Ok(InsertStatement {
            table,
            columns,
            rows,
        })
    }

    fn parse_value_row(&mut self) -> Result<Vec<Expr>> {
        self.expect_punct("(")?;
        let mut values = vec![self.parse_expr()?];
        while self.eat_punct(",") {
            values.push(self.parse_expr()?);
        }
        self.expect_punct(")")?;
        Ok(values)
    }

    // ---- UPDATE / DELETE ----------------------------------------------------

    fn parse_update(&mut self) -> Result<UpdateStatement> {
        self.expect_keyword("UPDATE")?;
        let table = self.expect_identifier()?;
        self.expect_keyword("SET")?;

        let mut assignments = vec![self.parse_assignment()?];
        while self.eat_punct(",") {
            assignments.push(self.parse_assignment()?);
        }

        let where_clause = if self.eat_keyword("WHERE") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let returning = self.parse_returning()?;

        Ok(UpdateStatement {
            table,
            assignments,
            where_clause,
            returning,
        })
    }

    fn parse_assignment(&mut self) -> Result<(String, Expr)> {
        let col = self.expect_identifier()?;
        if !self
            .peek()
            .is_some_and(|t| t.kind == TokenType::Operator && t.text == "=")
        {
            return Err(self.unexpected("="));
        }
        self.pos += 1;
        let expr = self.parse_expr()?;
        Ok((col, expr))
    }

    fn parse_delete(&mut self) -> Result<DeleteStatement> {
        self.expect_keyword("DELETE")?;
        self.expect_keyword("FROM")?;
        let table = self.expect_identifier()?;

        let where_clause = if self.eat_keyword("WHERE") {
            Some(self.parse_expr()?)
        } else {
            None
        };

        let returning = self.parse_returning()?;

        Ok(DeleteStatement {
            table,
            where_clause,
            returning,
        })
    }

    fn parse_returning(&mut self) -> Result<Option<Vec<SelectItem>>> {
        if !self.eat_keyword("RETURNING") {
            return Ok(None);
        }
        let mut items = vec![self.parse_select_item()?];
        while self.eat_punct(",") {
            items.push(self.parse_select_item()?);
        }
        Ok(Some(items))
    }

    // ---- DDL ---------------------------------------------------------------

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect_keyword("CREATE")?;
        let unique = self.eat_keyword("UNIQUE");

        if self.eat_keyword("INDEX") {
            let if_not_exists = self.eat_keyword("IF") && {
                self.expect_keyword("NOT")?;
                self.expect_keyword("EXISTS")?;
                true
            };
            let name = self.expect_identifier()?;
            self.expect_keyword("ON")?;
            let table = self.expect_identifier()?;
            self.expect_punct("(")?;
            let mut columns = vec![self.expect_identifier()?];
            while self.eat_punct(",") {
                columns.push(self.expect_identifier()?);
            }
            self.expect_punct(")")?;
            return Ok(Statement::CreateIndex(CreateIndexStatement {
                unique,
                if_not_exists,
                name,
                table,
                columns,
            }));
        }

        if unique {
            return Err(self.unexpected("INDEX"));
        }

        self.expect_keyword("TABLE")?;
        let if_not_exists = self.eat_keyword("IF") && {
            self.expect_keyword("NOT")?;
            self.expect_keyword("EXISTS")?;
            true
        };
        let name = self.expect_identifier()?;
        self.expect_punct("(")?;

        let mut columns = Vec::new();
        let mut table_constraints = Vec::new();

        loop {
            if self.eat_keyword("PRIMARY") {
                self.expect_keyword("KEY")?;
                self.expect_punct("(")?;
                let mut cols = vec![self.expect_identifier()?];
                while self.eat_punct(",") {
                    cols.push(self.expect_identifier()?);
                }
                self.expect_punct(")")?;
                table_constraints.push(TableConstraint::PrimaryKey(cols));
            } else {
                columns.push(self.parse_column_def()?);
            }

            if !self.eat_punct(",") {
                break;
            }
        }

        self.expect_punct(")")?;

        Ok(Statement::CreateTable(CreateTableStatement {
            if_not_exists,
            name,
            columns,
            table_constraints,
        }))
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.expect_identifier()?;
        let mut constraints = Vec::new();

        loop {
            if self.eat_keyword("PRIMARY") {
                self.expect_keyword("KEY")?;
                constraints.push(ColumnConstraint::PrimaryKey);
            } else if self.eat_keyword("NOT") {
                self.expect_keyword("NULL")?;
                constraints.push(ColumnConstraint::NotNull);
            } else if self.eat_keyword("UNIQUE") {
                constraints.push(ColumnConstraint::Unique);
            } else if self.eat_keyword("DEFAULT") {
                constraints.push(ColumnConstraint::Default(self.parse_primary()?));
            } else {
                break;
            }
        }

        Ok(ColumnDef {
            name,
            data_type,
            constraints,
        })
    }

    fn parse_alter_table(&mut self) -> Result<AlterTableStatement> {
        self.expect_keyword("ALTER")?;
        self.expect_keyword("TABLE")?;
        let table = self.expect_identifier()?;

        let action = if self.eat_keyword("ADD") {
            self.eat_keyword("COLUMN");
            AlterAction::AddColumn(self.parse_column_def()?)
        } else if self.eat_keyword("RENAME") {
            if self.eat_keyword("COLUMN") {
                let old = self.expect_identifier()?;
                self.expect_keyword("TO")?;
                let new = self.expect_identifier()?;
                AlterAction::RenameColumn { old, new }
            } else {
                self.expect_keyword("TO")?;
                AlterAction::RenameTable(self.expect_identifier()?)
            }
        } else if self.eat_keyword("DROP") {
            self.eat_keyword("COLUMN");
            AlterAction::DropColumn(self.expect_identifier()?)
        } else {
            return Err(self.unexpected("ADD, RENAME or DROP"));
        };

        Ok(AlterTableStatement { table, action })
    }

    fn parse_drop_table(&mut self) -> Result<DropTableStatement> {
        self.expect_keyword("DROP")?;
        self.expect_keyword("TABLE")?;
        let if_exists = self.eat_keyword("IF") && {
            self.expect_keyword("EXISTS")?;
            true
        };
        let name = self.expect_identifier()?;
        Ok(DropTableStatement { if_exists, name })
    }

    fn parse_pragma(&mut self) -> Result<PragmaStatement> {
        self.expect_keyword("PRAGMA")?;
        let name = self.expect_identifier()?;

        let value = if self
            .peek()
            .is_some_and(|t| t.kind == TokenType::Operator && t.text == "=")
        {
            self.pos += 1;
            Some(PragmaValue::Equals(self.parse_primary()?))
        } else if self.eat_punct("(") {
            let mut args = vec![self.parse_expr()?];
            while self.eat_punct(",") {
                args.push(self.parse_expr()?);
            }
            self.expect_punct(")")?;
            Some(PragmaValue::Args(args))
        } else {
            None
        };

        Ok(PragmaStatement { name, value })
    }

    // ---- Expressions --------------------------------------------------------

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_keyword("OR") {
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat_keyword("AND") {
            let right = self.parse_not()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat_keyword("NOT") {
            Ok(Expr::Not(Box::new(self.parse_not()?)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let expr = self.parse_additive()?;

        if let Some(op) = self.peek_comparison_op() {
            self.pos += 1;
            let right = self.parse_additive()?;
            return Ok(Expr::BinaryOp {
                left: Box::new(expr),
                op,
                right: Box::new(right),
            });
        }

        if self.eat_keyword("LIKE") {
            let right = self.parse_additive()?;
            return Ok(Expr::BinaryOp {
                left: Box::new(expr),
                op: BinaryOp::Like,
                right: Box::new(right),
            });
        }

        let negated = self.eat_keyword("NOT");

        if self.eat_keyword("IN") {
            self.expect_punct("(")?;
            // `IN (SELECT ...)` vs `IN (a, b, c)`.
            if self.peek().is_some_and(|t| t.is("SELECT")) {
                let subquery = self.parse_select()?;
                self.expect_punct(")")?;
                return Ok(Expr::InSubquery {
                    expr: Box::new(expr),
                    subquery: Box::new(subquery),
                    negated,
                });
            }
            let mut list = vec![self.parse_expr()?];
            while self.eat_punct(",") {
                list.push(self.parse_expr()?);
            }
            self.expect_punct(")")?;
            return Ok(Expr::InList {
                expr: Box::new(expr),
                list,
                negated,
            });
        }

        if self.eat_keyword("BETWEEN") {
            let low = self.parse_additive()?;
            self.expect_keyword("AND")?;
            let high = self.parse_additive()?;
            return Ok(Expr::Between {
                expr: Box::new(expr),
                low: Box::new(low),
                high: Box::new(high),
                negated,
            });
        }

        if negated {
            return Err(self.unexpected("IN or BETWEEN"));
        }

        if self.eat_keyword("IS") {
            let negated = self.eat_keyword("NOT");
            self.expect_keyword("NULL")?;
            return Ok(Expr::IsNull {
                expr: Box::new(expr),
                negated,
            });
        }

        Ok(expr)
    }

    fn peek_comparison_op(&self) -> Option<BinaryOp> {
        let tok = self.peek()?;
        if tok.kind != TokenType::Operator {
            return None;
        }
        match tok.text.as_str() {
            "=" => Some(BinaryOp::Eq),
            "!=" | "<>" => Some(BinaryOp::NotEq),
            "<" => Some(BinaryOp::Lt),
            "<=" => Some(BinaryOp::LtEq),
            ">" => Some(BinaryOp::Gt),
            ">=" => Some(BinaryOp::GtEq),
            _ => None,
        }
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(t) if t.kind == TokenType::Operator && t.text == "+" => BinaryOp::Add,
                Some(t) if t.kind == TokenType::Operator && t.text == "-" => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_primary()?;
        loop {
            let op = match self.peek() {
                Some(t) if t.kind == TokenType::Operator && t.text == "*" => BinaryOp::Mul,
                Some(t) if t.kind == TokenType::Operator && t.text == "/" => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let right = self.parse_primary()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let tok = self.peek().cloned().ok_or(Error::UnexpectedEof {
            expected: "an expression".into(),
        })?;

        match tok.kind {
            TokenType::Placeholder => {
                self.pos += 1;
                let idx = self.next_placeholder;
                self.next_placeholder += 1;
                Ok(Expr::Placeholder(idx))
            }
            TokenType::Number => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Number(tok.text)))
            }
            TokenType::String => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::String(tok.text)))
            }
            TokenType::Keyword if tok.is("NULL") => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Null))
            }
            TokenType::Keyword if tok.is("TRUE") => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenType::Keyword if tok.is("FALSE") => {
                self.pos += 1;
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenType::Keyword if tok.is("CASE") => self.parse_case(),
            TokenType::Function => self.parse_function_call(),
            TokenType::Identifier => self.parse_identifier_or_call(),
            TokenType::Punctuation if tok.text == "(" => {
                self.pos += 1;
                if self.peek().is_some_and(|t| t.is("SELECT")) {
                    let subquery = self.parse_select()?;
                    self.expect_punct(")")?;
                    return Ok(Expr::Subquery(Box::new(subquery)));
                }
                let inner = self.parse_expr()?;
                self.expect_punct(")")?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            TokenType::Operator if tok.text == "-" || tok.text == "+" => {
                // Sign is external to the number: `-5` is operator `-`
                // followed by number `5`.
                self.pos += 1;
                let operand = self.parse_primary()?;
                if tok.text == "-" {
                    Ok(Expr::BinaryOp {
                        left: Box::new(Expr::Literal(Literal::Number("0".into()))),
                        op: BinaryOp::Sub,
                        right: Box::new(operand),
                    })
                } else {
                    Ok(operand)
                }
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_identifier_or_call(&mut self) -> Result<Expr> {
        let first = self.expect_identifier()?;

        if self.eat_punct(".") {
            let second = self.expect_identifier()?;
            if self.peek().is_some_and(|t| t.is(".")) {
                return Err(Error::TooManyQualifiers(format!("{first}.{second}")));
            }
            return Ok(Expr::Identifier(Identifier {
                qualifier: Some(first),
                name: second,
            }));
        }

        Ok(Expr::Identifier(Identifier {
            qualifier: None,
            name: first,
        }))
    }

    fn parse_function_call(&mut self) -> Result<Expr> {
        let tok = self.advance().expect("checked by caller");
        let name = tok.text;
        self.expect_punct("(")?;

        let distinct = self.eat_keyword("DISTINCT");

        let mut args = Vec::new();
        if !self
            .peek()
            .is_some_and(|t| t.kind == TokenType::Operator && t.text == "*")
        {
            if !self.peek().is_some_and(|t| t.text == ")") {
                args.push(self.parse_expr()?);
                while self.eat_punct(",") {
                    args.push(self.parse_expr()?);
                }
            }
        } else {
            // COUNT(*) - represented as a bare identifier "*" argument.
            self.pos += 1;
        }

        self.expect_punct(")")?;

        Ok(Expr::FunctionCall {
            name,
            args,
            distinct,
        })
    }

    fn parse_case(&mut self) -> Result<Expr> {
        self.expect_keyword("CASE")?;

        let operand = if self.peek().is_some_and(|t| t.is("WHEN")) {
            None
        } else {
            Some(Box::new(self.parse_expr()?))
        };

        let mut whens = Vec::new();
        while self.eat_keyword("WHEN") {
            let when = self.parse_expr()?;
            self.expect_keyword("THEN")?;
            let then = self.parse_expr()?;
            whens.push((when, then));
        }

        let else_ = if self.eat_keyword("ELSE") {
            Some(Box::new(self.parse_expr()?))
        } else {
            None
        };

        self.expect_keyword("END")?;

        Ok(Expr::Case {
            operand,
            whens,
            else_,
        })
    }
}

/// Parse a single SQL statement.
pub fn parse(sql: &str) -> Result<Statement> {
    Parser::from_sql(sql)?.parse_statement()
}
