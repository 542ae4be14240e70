//! Lexer for `$filter` expressions using logos.

use std::fmt;
use std::ops::Range;

use chrono::NaiveDate;
use logos::Logos;

use super::errors::{QueryError, QueryResult};
use super::options::QueryOption;

/// Token types for the filter grammar.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token {
    // Comparison operators
    #[token("eq")]
    Eq,
    #[token("ne")]
    Ne,
    #[token("gt")]
    Gt,
    #[token("ge")]
    Ge,
    #[token("lt")]
    Lt,
    #[token("le")]
    Le,

    // Logical operators
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,

    // Literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Unquoted date literal; an impossible date is a lexer error
    #[regex(r"[0-9]{4}-[0-9]{2}-[0-9]{2}", |lex| {
        NaiveDate::parse_from_str(lex.slice(), "%Y-%m-%d").ok()
    })]
    Date(NaiveDate),

    // Field or function name
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Single-quoted string, '' escapes a quote
    #[regex(r"'([^']|'')*'", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].replace("''", "'")
    })]
    String(String),

    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eq => f.write_str("'eq'"),
            Token::Ne => f.write_str("'ne'"),
            Token::Gt => f.write_str("'gt'"),
            Token::Ge => f.write_str("'ge'"),
            Token::Lt => f.write_str("'lt'"),
            Token::Le => f.write_str("'le'"),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::Not => f.write_str("'not'"),
            Token::True => f.write_str("'true'"),
            Token::False => f.write_str("'false'"),
            Token::Null => f.write_str("'null'"),
            Token::Date(d) => write!(f, "date {}", d.format("%Y-%m-%d")),
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::String(s) => write!(f, "string '{}'", s),
            Token::Int(n) => write!(f, "number {}", n),
            Token::Float(n) => write!(f, "number {}", n),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
        }
    }
}

/// A token with its byte range in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Range<usize>,
}

/// Tokenize a `$filter` expression.
///
/// Unlike a permissive lexer this stops at the first unrecognized input:
/// a malformed filter must be rejected, not partially understood.
pub fn tokenize(source: &str) -> QueryResult<Vec<SpannedToken>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => {
                return Err(QueryError::invalid(
                    QueryOption::Filter,
                    format!(
                        "unrecognized input '{}' at position {}",
                        lexer.slice(),
                        span.start
                    ),
                ));
            }
        }
    }

    Ok(tokens)
}
