//! # Query Option Parser
//!
//! Parses query-string options into a [`QueryDescriptor`]. Parsing is purely
//! syntactic; field names and types are checked later against the entity
//! schema by the shaper.

use std::collections::HashSet;

use super::errors::{QueryError, QueryResult};
use super::filter::{ComparisonOp, FilterExpr, Operand, Scalar, StringFunction};
use super::lexer::{tokenize, SpannedToken, Token};
use super::options::{QueryOption, MAX_FILTER_DEPTH};

/// Parsed query options for one request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDescriptor {
    /// Fields to project (None = option absent)
    pub select: Option<Selection>,

    /// Filter predicate
    pub filter: Option<FilterExpr>,

    /// Order by clauses, highest priority first
    pub order_by: Option<Vec<OrderBy>>,

    /// Number of records to skip
    pub skip: Option<usize>,

    /// Maximum number of records to return
    pub top: Option<usize>,

    /// Whether to report the filtered count
    pub count: Option<bool>,
}

/// Requested projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// `*`: every field
    All,
    /// Named fields, duplicates removed, in request order
    Fields(Vec<String>),
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Order by clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl QueryDescriptor {
    /// Parse query-string pairs.
    ///
    /// Keys are matched with or without the `$` prefix. Unknown `$` options
    /// and repeated options are rejected; other unknown keys are ignored.
    pub fn parse<I, K, V>(params: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut result = QueryDescriptor::default();
        let mut seen = HashSet::new();

        for (key, value) in params {
            let key = key.as_ref();
            let value = value.as_ref();

            let Some(option) = QueryOption::from_name(key) else {
                if key.starts_with('$') {
                    return Err(QueryError::invalid(key, "unsupported query option"));
                }
                // Custom query option
                continue;
            };

            if !seen.insert(option) {
                return Err(QueryError::invalid(option, "specified more than once"));
            }

            match option {
                QueryOption::Select => result.select = Some(parse_select(value)?),
                QueryOption::Filter => result.filter = Some(parse_filter(value)?),
                QueryOption::OrderBy => result.order_by = Some(parse_order_by(value)?),
                QueryOption::Skip => result.skip = Some(parse_count_value(option, value)?),
                QueryOption::Top => result.top = Some(parse_count_value(option, value)?),
                QueryOption::Count => result.count = Some(parse_bool(option, value)?),
            }
        }

        Ok(result)
    }

    /// True if no query option was given
    pub fn is_empty(&self) -> bool {
        self == &QueryDescriptor::default()
    }

    /// Options present in this descriptor
    pub fn options(&self) -> Vec<QueryOption> {
        let mut options = Vec::new();
        if self.select.is_some() {
            options.push(QueryOption::Select);
        }
        if self.filter.is_some() {
            options.push(QueryOption::Filter);
        }
        if self.order_by.is_some() {
            options.push(QueryOption::OrderBy);
        }
        if self.skip.is_some() {
            options.push(QueryOption::Skip);
        }
        if self.top.is_some() {
            options.push(QueryOption::Top);
        }
        if self.count.is_some() {
            options.push(QueryOption::Count);
        }
        options
    }
}

fn is_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse select parameter (comma-separated field list)
fn parse_select(value: &str) -> QueryResult<Selection> {
    if value.trim().is_empty() {
        return Err(QueryError::invalid(QueryOption::Select, "select cannot be empty"));
    }

    let mut fields: Vec<String> = Vec::new();
    let mut all = false;

    for item in value.split(',') {
        let item = item.trim();
        if item == "*" {
            all = true;
        } else if is_field_name(item) {
            if !fields.iter().any(|f| f == item) {
                fields.push(item.to_string());
            }
        } else if item.is_empty() {
            return Err(QueryError::invalid(QueryOption::Select, "empty field name in list"));
        } else {
            return Err(QueryError::invalid(
                QueryOption::Select,
                format!("malformed field name '{}'", item),
            ));
        }
    }

    if all {
        Ok(Selection::All)
    } else {
        Ok(Selection::Fields(fields))
    }
}

/// Parse orderby parameter (comma-separated `field [asc|desc]`)
fn parse_order_by(value: &str) -> QueryResult<Vec<OrderBy>> {
    let mut orders = Vec::new();

    for item in value.split(',') {
        let mut words = item.split_whitespace();

        let field = match words.next() {
            Some(field) if is_field_name(field) => field,
            Some(field) => {
                return Err(QueryError::invalid(
                    QueryOption::OrderBy,
                    format!("malformed field name '{}'", field),
                ))
            }
            None => {
                return Err(QueryError::invalid(QueryOption::OrderBy, "empty order by clause"))
            }
        };

        let direction = match words.next() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(other) => {
                return Err(QueryError::invalid(
                    QueryOption::OrderBy,
                    format!("invalid order direction '{}', expected 'asc' or 'desc'", other),
                ))
            }
        };

        if let Some(extra) = words.next() {
            return Err(QueryError::invalid(
                QueryOption::OrderBy,
                format!("unexpected '{}' after order by clause for '{}'", extra, field),
            ));
        }

        orders.push(OrderBy {
            field: field.to_string(),
            direction,
        });
    }

    Ok(orders)
}

/// Parse skip/top: a non-negative decimal integer
fn parse_count_value(option: QueryOption, value: &str) -> QueryResult<usize> {
    let n: i64 = value.trim().parse().map_err(|_| {
        QueryError::invalid(option, format!("expected an integer, got '{}'", value))
    })?;

    usize::try_from(n)
        .map_err(|_| QueryError::invalid(option, format!("must be non-negative, got {}", n)))
}

fn parse_bool(option: QueryOption, value: &str) -> QueryResult<bool> {
    match value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(QueryError::invalid(
            option,
            format!("expected 'true' or 'false', got '{}'", other),
        )),
    }
}

/// Parse a `$filter` expression
pub fn parse_filter(source: &str) -> QueryResult<FilterExpr> {
    let tokens = tokenize(source)?;
    let mut parser = FilterParser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_or()?;

    if let Some(tok) = parser.peek() {
        return Err(parser.error_at(tok, format!("unexpected {}", tok.token)));
    }

    Ok(expr)
}

/// Recursive descent parser for `$filter`.
///
/// Precedence, loosest first: `or`, `and`, `not`, then comparisons.
struct FilterParser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    /// Open `not` operators and parentheses enclosing the current position
    depth: usize,
}

impl FilterParser {
    fn peek(&self) -> Option<&SpannedToken> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token> {
        self.peek().map(|t| &t.token)
    }

    fn next_token(&mut self) -> QueryResult<SpannedToken> {
        let tok = self.tokens.get(self.pos).cloned().ok_or_else(|| {
            QueryError::invalid(QueryOption::Filter, "unexpected end of expression")
        })?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect(&mut self, expected: Token) -> QueryResult<SpannedToken> {
        let tok = self.next_token()?;
        if tok.token != expected {
            return Err(self.error_at(&tok, format!("expected {}, found {}", expected, tok.token)));
        }
        Ok(tok)
    }

    fn error_at(&self, tok: &SpannedToken, message: String) -> QueryError {
        QueryError::invalid(
            QueryOption::Filter,
            format!("{} at position {}", message, tok.span.start),
        )
    }

    /// Enter one level of `not` or `(` nesting.
    ///
    /// Validation and evaluation recurse as deep as the parsed tree.
    fn descend(&mut self, tok: &SpannedToken) -> QueryResult<()> {
        self.depth += 1;
        if self.depth > MAX_FILTER_DEPTH {
            return Err(self.error_at(
                tok,
                format!(
                    "expression nested too deeply, the maximum depth is {}",
                    MAX_FILTER_DEPTH
                ),
            ));
        }
        Ok(())
    }

    fn ascend(&mut self) {
        self.depth -= 1;
    }

    /// Parse OR conditions.
    fn parse_or(&mut self) -> QueryResult<FilterExpr> {
        let mut left = self.parse_and()?;

        while self.peek_token() == Some(&Token::Or) {
            self.next_token()?; // consume 'or'

            let right = self.parse_and()?;
            left = match left {
                FilterExpr::Or(mut children) => {
                    children.push(right);
                    FilterExpr::Or(children)
                }
                _ => FilterExpr::Or(vec![left, right]),
            };
        }

        Ok(left)
    }

    /// Parse AND conditions.
    fn parse_and(&mut self) -> QueryResult<FilterExpr> {
        let mut left = self.parse_unary()?;

        while self.peek_token() == Some(&Token::And) {
            self.next_token()?; // consume 'and'

            let right = self.parse_unary()?;
            left = match left {
                FilterExpr::And(mut children) => {
                    children.push(right);
                    FilterExpr::And(children)
                }
                _ => FilterExpr::And(vec![left, right]),
            };
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> QueryResult<FilterExpr> {
        if self.peek_token() == Some(&Token::Not) {
            let tok = self.next_token()?; // consume 'not'
            self.descend(&tok)?;
            let inner = self.parse_unary()?;
            self.ascend();
            return Ok(FilterExpr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    /// Parse a parenthesized group, a function call, a comparison or a bare
    /// boolean operand.
    fn parse_primary(&mut self) -> QueryResult<FilterExpr> {
        if self.peek_token() == Some(&Token::LParen) {
            let tok = self.next_token()?;
            self.descend(&tok)?;
            let inner = self.parse_or()?;
            self.expect(Token::RParen)?;
            self.ascend();
            return Ok(inner);
        }

        let is_call = matches!(
            (self.peek_token(), self.tokens.get(self.pos + 1).map(|t| &t.token)),
            (Some(Token::Ident(_)), Some(Token::LParen))
        );
        if is_call {
            return self.parse_function_call();
        }

        let left = self.parse_operand()?;
        let op = match self.peek_token() {
            Some(Token::Eq) => ComparisonOp::Eq,
            Some(Token::Ne) => ComparisonOp::Ne,
            Some(Token::Gt) => ComparisonOp::Gt,
            Some(Token::Ge) => ComparisonOp::Ge,
            Some(Token::Lt) => ComparisonOp::Lt,
            Some(Token::Le) => ComparisonOp::Le,
            _ => return Ok(FilterExpr::Operand(left)),
        };
        self.next_token()?; // consume operator

        let right = self.parse_operand()?;
        Ok(FilterExpr::Compare { left, op, right })
    }

    fn parse_function_call(&mut self) -> QueryResult<FilterExpr> {
        let name_tok = self.next_token()?;
        let Token::Ident(name) = &name_tok.token else {
            return Err(self.error_at(
                &name_tok,
                format!("expected function name, found {}", name_tok.token),
            ));
        };
        let function = StringFunction::from_name(name)
            .ok_or_else(|| self.error_at(&name_tok, format!("unknown function '{}'", name)))?;

        self.expect(Token::LParen)?;
        let subject = self.parse_operand()?;
        self.expect(Token::Comma)?;
        let argument = self.parse_operand()?;
        self.expect(Token::RParen)?;

        Ok(FilterExpr::Function {
            function,
            subject,
            argument,
        })
    }

    fn parse_operand(&mut self) -> QueryResult<Operand> {
        let SpannedToken { token, span } = self.next_token()?;
        let operand = match token {
            Token::Ident(name) => Operand::Field(name),
            Token::String(s) => Operand::Literal(Scalar::String(s)),
            Token::Int(n) => Operand::Literal(Scalar::Int(n)),
            Token::Float(n) => Operand::Literal(Scalar::Float(n)),
            Token::Date(d) => Operand::Literal(Scalar::Date(d)),
            Token::True => Operand::Literal(Scalar::Bool(true)),
            Token::False => Operand::Literal(Scalar::Bool(false)),
            Token::Null => Operand::Literal(Scalar::Null),
            other => {
                return Err(QueryError::invalid(
                    QueryOption::Filter,
                    format!(
                        "expected field or literal, found {} at position {}",
                        other, span.start
                    ),
                ))
            }
        };
        Ok(operand)
    }
}
