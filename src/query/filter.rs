//! # Filter Expression AST
//!
//! Represents `$filter` predicates, checks them against an entity schema and
//! evaluates them against records.

use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::options::{QueryOption, QuerySettings};
use crate::schema::{EntitySchema, FieldType, Record};

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "eq",
            ComparisonOp::Ne => "ne",
            ComparisonOp::Gt => "gt",
            ComparisonOp::Ge => "ge",
            ComparisonOp::Lt => "lt",
            ComparisonOp::Le => "le",
        }
    }

    fn is_equality(&self) -> bool {
        matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }
}

/// String functions usable as predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StringFunction {
    /// `contains(haystack, needle)`
    Contains,
    /// `startswith(value, prefix)`
    StartsWith,
    /// `endswith(value, suffix)`
    EndsWith,
}

impl StringFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StringFunction::Contains => "contains",
            StringFunction::StartsWith => "startswith",
            StringFunction::EndsWith => "endswith",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "contains" => Some(StringFunction::Contains),
            "startswith" => Some(StringFunction::StartsWith),
            "endswith" => Some(StringFunction::EndsWith),
            _ => None,
        }
    }

    fn call(&self, subject: &str, argument: &str) -> bool {
        match self {
            StringFunction::Contains => subject.contains(argument),
            StringFunction::StartsWith => subject.starts_with(argument),
            StringFunction::EndsWith => subject.ends_with(argument),
        }
    }
}

/// A typed scalar: a filter literal, or a record value read through its
/// field type.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
}

impl Scalar {
    /// Read a record value as `field_type`.
    ///
    /// Missing values, JSON nulls and values that do not fit the field type
    /// all read as `Null`.
    pub fn from_json(value: Option<&Value>, field_type: FieldType) -> Scalar {
        let Some(value) = value else {
            return Scalar::Null;
        };

        match (field_type, value) {
            (FieldType::String, Value::String(s)) => Scalar::String(s.clone()),
            (FieldType::Bool, Value::Bool(b)) => Scalar::Bool(*b),
            (FieldType::Int, Value::Number(n)) => n
                .as_i64()
                .map(Scalar::Int)
                .or_else(|| n.as_f64().map(Scalar::Float))
                .unwrap_or(Scalar::Null),
            (FieldType::Float, Value::Number(n)) => {
                n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null)
            }
            (FieldType::Date, Value::String(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(Scalar::Date)
                .unwrap_or(Scalar::Null),
            _ => Scalar::Null,
        }
    }

    /// The field type this scalar belongs to (`None` for null)
    pub fn field_type(&self) -> Option<FieldType> {
        match self {
            Scalar::Null => None,
            Scalar::Bool(_) => Some(FieldType::Bool),
            Scalar::Int(_) => Some(FieldType::Int),
            Scalar::Float(_) => Some(FieldType::Float),
            Scalar::String(_) => Some(FieldType::String),
            Scalar::Date(_) => Some(FieldType::Date),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    /// Compare two non-null scalars of comparable types.
    ///
    /// Returns `None` when either side is null or the types do not compare.
    pub fn compare(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Int(a), Scalar::Int(b)) => Some(a.cmp(b)),
            (Scalar::Int(a), Scalar::Float(b)) => compare_int_float(*a, *b),
            (Scalar::Float(a), Scalar::Int(b)) => compare_int_float(*b, *a).map(Ordering::reverse),
            (Scalar::Float(a), Scalar::Float(b)) => a.partial_cmp(b),
            (Scalar::String(a), Scalar::String(b)) => Some(a.cmp(b)),
            (Scalar::Date(a), Scalar::Date(b)) => Some(a.cmp(b)),
            (Scalar::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Total order used by `$orderby`: null sorts before every value.
    pub fn sort_cmp(&self, other: &Scalar) -> Ordering {
        match (self.is_null(), other.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.compare(other).unwrap_or(Ordering::Equal),
        }
    }
}

/// Exact comparison of an int with a float.
///
/// Converting the int to `f64` rounds above 2^53, so the float is split
/// into its integral and fractional parts instead.
fn compare_int_float(int: i64, float: f64) -> Option<Ordering> {
    // 2^63: the first float above i64::MAX
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    if float >= I64_BOUND {
        return Some(Ordering::Less);
    }
    if float < -I64_BOUND {
        return Some(Ordering::Greater);
    }

    let whole = float.trunc();
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        ordering => Some(ordering),
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(n) => write!(f, "{}", n),
            Scalar::Float(n) => write!(f, "{}", n),
            Scalar::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Scalar::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// One side of a comparison or a function argument
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Reference to a field of the entity
    Field(String),
    /// Constant value
    Literal(Scalar),
}

impl Operand {
    pub fn field(name: impl Into<String>) -> Self {
        Operand::Field(name.into())
    }

    pub fn literal(value: Scalar) -> Self {
        Operand::Literal(value)
    }

    /// Static type of this operand; `Ok(None)` for a null literal
    fn resolve_type(&self, schema: &EntitySchema) -> QueryResult<Option<FieldType>> {
        match self {
            Operand::Field(name) => schema.field_type(name).map(Some).ok_or_else(|| {
                QueryError::invalid(
                    QueryOption::Filter,
                    format!("unknown field '{}' on {}", name, schema.name),
                )
            }),
            Operand::Literal(value) => Ok(value.field_type()),
        }
    }

    fn evaluate(&self, record: &Record, schema: &EntitySchema) -> Scalar {
        match self {
            Operand::Field(name) => match schema.field_type(name) {
                Some(field_type) => Scalar::from_json(record.get(name), field_type),
                None => Scalar::Null,
            },
            Operand::Literal(value) => value.clone(),
        }
    }

    fn describe(&self) -> String {
        match self {
            Operand::Field(name) => format!("field '{}'", name),
            Operand::Literal(value) => format!("literal {}", value),
        }
    }
}

/// A filter predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `left op right`
    Compare {
        left: Operand,
        op: ComparisonOp,
        right: Operand,
    },
    /// `function(subject, argument)`
    Function {
        function: StringFunction,
        subject: Operand,
        argument: Operand,
    },
    /// A bare boolean field or literal
    Operand(Operand),
    /// All must hold
    And(Vec<FilterExpr>),
    /// Any must hold
    Or(Vec<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Create a comparison predicate
    pub fn compare(left: Operand, op: ComparisonOp, right: Operand) -> Self {
        FilterExpr::Compare { left, op, right }
    }

    /// Create a `field eq value` predicate
    pub fn eq(field: impl Into<String>, value: Scalar) -> Self {
        Self::compare(Operand::field(field), ComparisonOp::Eq, Operand::literal(value))
    }

    /// Number of nodes in the tree, operands included
    pub fn node_count(&self) -> usize {
        match self {
            FilterExpr::Compare { .. } | FilterExpr::Function { .. } => 3,
            FilterExpr::Operand(_) => 1,
            FilterExpr::And(children) | FilterExpr::Or(children) => {
                1 + children.iter().map(FilterExpr::node_count).sum::<usize>()
            }
            FilterExpr::Not(inner) => 1 + inner.node_count(),
        }
    }

    /// Check every field reference and operand type against `schema`.
    ///
    /// A predicate that passes validation cannot fail during evaluation.
    pub fn validate(&self, schema: &EntitySchema, settings: &QuerySettings) -> QueryResult<()> {
        match self {
            FilterExpr::Compare { left, op, right } => {
                let left_type = left.resolve_type(schema)?;
                let right_type = right.resolve_type(schema)?;
                match (left_type, right_type) {
                    (Some(l), Some(r)) if !l.is_comparable_with(r) => Err(QueryError::invalid(
                        QueryOption::Filter,
                        format!(
                            "cannot compare {} ({}) with {} ({}) using '{}'",
                            left.describe(),
                            l.type_name(),
                            right.describe(),
                            r.type_name(),
                            op.as_str()
                        ),
                    )),
                    (None, _) | (_, None) if !op.is_equality() => Err(QueryError::invalid(
                        QueryOption::Filter,
                        format!("null can only be compared with 'eq' or 'ne', not '{}'", op.as_str()),
                    )),
                    _ => Ok(()),
                }
            }
            FilterExpr::Function {
                function,
                subject,
                argument,
            } => {
                if !settings.allows_function(*function) {
                    return Err(QueryError::invalid(
                        QueryOption::Filter,
                        format!("function '{}' is not allowed", function.as_str()),
                    ));
                }
                for operand in [subject, argument] {
                    let operand_type = operand.resolve_type(schema)?;
                    if operand_type != Some(FieldType::String) {
                        return Err(QueryError::invalid(
                            QueryOption::Filter,
                            format!(
                                "function '{}' expects string arguments, got {} ({})",
                                function.as_str(),
                                operand.describe(),
                                operand_type.map_or("null", |t| t.type_name())
                            ),
                        ));
                    }
                }
                Ok(())
            }
            FilterExpr::Operand(operand) => {
                let operand_type = operand.resolve_type(schema)?;
                if operand_type != Some(FieldType::Bool) {
                    return Err(QueryError::invalid(
                        QueryOption::Filter,
                        format!(
                            "{} is not a boolean expression",
                            operand.describe()
                        ),
                    ));
                }
                Ok(())
            }
            FilterExpr::And(children) | FilterExpr::Or(children) => children
                .iter()
                .try_for_each(|child| child.validate(schema, settings)),
            FilterExpr::Not(inner) => inner.validate(schema, settings),
        }
    }

    /// Check if a record matches this predicate.
    ///
    /// Ordering comparisons involving null never match; `eq null` matches
    /// missing and null values.
    pub fn matches(&self, record: &Record, schema: &EntitySchema) -> bool {
        match self {
            FilterExpr::Compare { left, op, right } => {
                let l = left.evaluate(record, schema);
                let r = right.evaluate(record, schema);
                match op {
                    ComparisonOp::Eq if l.is_null() || r.is_null() => l.is_null() && r.is_null(),
                    ComparisonOp::Ne if l.is_null() || r.is_null() => l.is_null() != r.is_null(),
                    ComparisonOp::Eq => l.compare(&r) == Some(Ordering::Equal),
                    ComparisonOp::Ne => l.compare(&r) != Some(Ordering::Equal),
                    ComparisonOp::Gt => l.compare(&r) == Some(Ordering::Greater),
                    ComparisonOp::Ge => matches!(
                        l.compare(&r),
                        Some(Ordering::Greater | Ordering::Equal)
                    ),
                    ComparisonOp::Lt => l.compare(&r) == Some(Ordering::Less),
                    ComparisonOp::Le => {
                        matches!(l.compare(&r), Some(Ordering::Less | Ordering::Equal))
                    }
                }
            }
            FilterExpr::Function {
                function,
                subject,
                argument,
            } => match (
                subject.evaluate(record, schema),
                argument.evaluate(record, schema),
            ) {
                (Scalar::String(s), Scalar::String(a)) => function.call(&s, &a),
                _ => false,
            },
            FilterExpr::Operand(operand) => {
                matches!(operand.evaluate(record, schema), Scalar::Bool(true))
            }
            FilterExpr::And(children) => children.iter().all(|c| c.matches(record, schema)),
            FilterExpr::Or(children) => children.iter().any(|c| c.matches(record, schema)),
            FilterExpr::Not(inner) => !inner.matches(record, schema),
        }
    }
}
