//! Backend-agnostic condition tree.
//!
//! Only the filtering resolver produces [`Value`]s and only the predicate
//! builder produces [`Predicate`]s; data-source adapters consume both.

use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOperator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOperator::Eq => "=",
            CompareOperator::Ne => "<>",
            CompareOperator::Gt => ">",
            CompareOperator::Ge => ">=",
            CompareOperator::Lt => "<",
            CompareOperator::Le => "<=",
        }
    }
}

/// Typed literal.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Number(BigDecimal),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    String(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Uuid(_) => "uuid",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::String(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{}", n.normalized()),
            Value::Uuid(u) => write!(f, "{}", u.as_hyphenated()),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// Condition tree. `All(vec![])` matches every row.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    All(Vec<Predicate>),
    Compare {
        field: String,
        op: CompareOperator,
        value: Value,
    },
    Contains {
        field: String,
        needle: String,
    },
    In {
        field: String,
        values: Vec<Value>,
    },
    Between {
        field: String,
        low: Value,
        high: Value,
    },
    IsNull {
        field: String,
    },
}

impl Predicate {
    /// The match-everything predicate.
    pub fn always() -> Self {
        Predicate::All(Vec::new())
    }

    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::All(nodes) if nodes.iter().all(Predicate::is_always))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::All(nodes) if nodes.is_empty() => f.write_str("TRUE"),
            Predicate::All(nodes) => {
                for (i, n) in nodes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" AND ")?;
                    }
                    if matches!(n, Predicate::All(inner) if inner.len() > 1) {
                        write!(f, "({n})")?;
                    } else {
                        write!(f, "{n}")?;
                    }
                }
                Ok(())
            }
            Predicate::Compare { field, op, value } => {
                write!(f, "{field} {} {value}", op.as_str())
            }
            Predicate::Contains { field, needle } => {
                write!(f, "{field} CONTAINS {}", Value::String(needle.clone()))
            }
            Predicate::In { field, values } => {
                write!(f, "{field} IN (")?;
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Predicate::Between { field, low, high } => {
                write!(f, "{field} BETWEEN {low} AND {high}")
            }
            Predicate::IsNull { field } => write!(f, "{field} IS NULL"),
        }
    }
}
