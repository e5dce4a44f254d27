use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::ast::{CompareOperator, Predicate, Value};
use crate::{Error, FieldKind, FieldWhitelist};

/// Separates `field`, `OPERATOR` and `value` in a raw filter expression.
pub const FILTER_SEPARATOR: &str = "||";
/// Separates the items of an `IN`/`BETWEEN` value.
pub const LIST_SEPARATOR: char = ',';

pub const MAX_FILTERS: usize = 20;
pub const MAX_FILTER_LEN: usize = 8 * 1024;
pub const MAX_IN_VALUES: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Contains,
    In,
    Between,
    IsNull,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "EQ",
            FilterOp::Ne => "NE",
            FilterOp::Gt => "GT",
            FilterOp::Gte => "GTE",
            FilterOp::Lt => "LT",
            FilterOp::Lte => "LTE",
            FilterOp::Contains => "CONTAINS",
            FilterOp::In => "IN",
            FilterOp::Between => "BETWEEN",
            FilterOp::IsNull => "IS_NULL",
        }
    }

    /// `GT`, `GTE`, `LT`, `LTE` and `BETWEEN`.
    pub fn is_ordered(self) -> bool {
        matches!(
            self,
            FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte | FilterOp::Between
        )
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "EQ" => FilterOp::Eq,
            "NE" => FilterOp::Ne,
            "GT" => FilterOp::Gt,
            "GTE" => FilterOp::Gte,
            "LT" => FilterOp::Lt,
            "LTE" => FilterOp::Lte,
            "CONTAINS" => FilterOp::Contains,
            "IN" => FilterOp::In,
            "BETWEEN" => FilterOp::Between,
            "IS_NULL" => FilterOp::IsNull,
            _ => return Err(Error::UnsupportedOperator(s.trim().to_string())),
        })
    }
}

/// Operand shape; always matches the operator's arity once resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    None,
    Scalar(Value),
    List(Vec<Value>),
    Range(Value, Value),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

/* ---------- coercion ---------- */

fn coerce(field: &str, kind: FieldKind, raw: &str) -> Result<Value, Error> {
    let invalid = || Error::InvalidValue {
        field: field.to_string(),
        expected: kind,
        value: raw.to_string(),
    };
    let trimmed = raw.trim();

    Ok(match kind {
        FieldKind::String => Value::String(raw.to_string()),
        FieldKind::I64 => {
            let i = trimmed.parse::<i64>().map_err(|_| invalid())?;
            Value::Number(BigDecimal::from(i))
        }
        FieldKind::F64 | FieldKind::Decimal => {
            Value::Number(BigDecimal::from_str(trimmed).map_err(|_| invalid())?)
        }
        FieldKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => return Err(invalid()),
        },
        FieldKind::Uuid => Value::Uuid(Uuid::parse_str(trimmed).map_err(|_| invalid())?),
        FieldKind::DateTimeUtc => {
            let dt = DateTime::parse_from_rfc3339(trimmed).map_err(|_| invalid())?;
            Value::DateTime(dt.with_timezone(&Utc))
        }
        FieldKind::Date => {
            Value::Date(NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| invalid())?)
        }
    })
}

fn split_list(raw: &str) -> Result<Vec<&str>, Error> {
    let items: Vec<&str> = raw.split(LIST_SEPARATOR).map(str::trim).collect();
    if items.iter().any(|s| s.is_empty()) {
        return Err(Error::InvalidFilter(format!("empty item in value list '{raw}'")));
    }
    Ok(items)
}

/* ---------- single expression ---------- */

fn resolve_one(raw: &str, whitelist: &FieldWhitelist) -> Result<FilterClause, Error> {
    if raw.len() > MAX_FILTER_LEN {
        return Err(Error::InvalidFilter("filter expression too long".into()));
    }

    let mut parts = raw.splitn(3, FILTER_SEPARATOR);
    let name = parts.next().unwrap_or_default().trim();
    let op_raw = parts.next().ok_or_else(|| {
        Error::InvalidFilter(format!("expected field||OPERATOR[||value], got '{raw}'"))
    })?;
    let value_raw = parts.next();

    if name.is_empty() {
        return Err(Error::InvalidFilter(format!("empty field name in '{raw}'")));
    }

    let field = whitelist
        .get(name)
        .ok_or_else(|| Error::UnknownField(name.to_string()))?;
    let op: FilterOp = op_raw.parse()?;

    if op == FilterOp::Contains && !field.kind.is_text() {
        return Err(Error::OperatorNotApplicable {
            op,
            field: field.name.clone(),
        });
    }
    if op.is_ordered() && !field.kind.is_ordered() {
        return Err(Error::OperatorNotApplicable {
            op,
            field: field.name.clone(),
        });
    }

    let value = match op {
        FilterOp::IsNull => match value_raw {
            None => FilterValue::None,
            Some(v) if v.trim().is_empty() => FilterValue::None,
            Some(v) => {
                return Err(Error::ArityMismatch {
                    op,
                    expected: "0",
                    got: v.split(LIST_SEPARATOR).count(),
                })
            }
        },
        FilterOp::In => {
            let raw_value = value_raw.filter(|v| !v.trim().is_empty()).ok_or(
                Error::ArityMismatch {
                    op,
                    expected: "at least 1",
                    got: 0,
                },
            )?;
            let items = split_list(raw_value)?;
            if items.len() > MAX_IN_VALUES {
                return Err(Error::InvalidFilter(format!(
                    "IN list exceeds {MAX_IN_VALUES} values"
                )));
            }
            FilterValue::List(
                items
                    .into_iter()
                    .map(|s| coerce(&field.name, field.kind, s))
                    .collect::<Result<_, _>>()?,
            )
        }
        FilterOp::Between => {
            let raw_value = value_raw.unwrap_or_default();
            let items = if raw_value.trim().is_empty() {
                Vec::new()
            } else {
                split_list(raw_value)?
            };
            match items.as_slice() {
                [low, high] => FilterValue::Range(
                    coerce(&field.name, field.kind, low)?,
                    coerce(&field.name, field.kind, high)?,
                ),
                _ => {
                    return Err(Error::ArityMismatch {
                        op,
                        expected: "2",
                        got: items.len(),
                    })
                }
            }
        }
        FilterOp::Contains => match value_raw {
            Some(v) if !v.is_empty() => FilterValue::Scalar(Value::String(v.to_string())),
            _ => {
                return Err(Error::ArityMismatch {
                    op,
                    expected: "1",
                    got: 0,
                })
            }
        },
        FilterOp::Eq | FilterOp::Ne | FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
            let v = value_raw.ok_or(Error::ArityMismatch {
                op,
                expected: "1",
                got: 0,
            })?;
            FilterValue::Scalar(coerce(&field.name, field.kind, v)?)
        }
    };

    Ok(FilterClause {
        field: field.name.clone(),
        op,
        value,
    })
}

/// Resolve raw `field||OPERATOR[||value]` expressions into typed clauses.
///
/// The first invalid expression fails the whole request: an accepted filter is
/// always applied, never silently dropped.
pub fn resolve_filtering(raw: &[&str], whitelist: &FieldWhitelist) -> Result<Vec<FilterClause>, Error> {
    let raw: Vec<&str> = raw.iter().copied().filter(|s| !s.trim().is_empty()).collect();
    if raw.len() > MAX_FILTERS {
        return Err(Error::InvalidFilter(format!(
            "too many filters (max {MAX_FILTERS})"
        )));
    }
    raw.into_iter().map(|r| resolve_one(r, whitelist)).collect()
}

/* ---------- predicate builder ---------- */

impl FilterValue {
    fn arity(&self) -> usize {
        match self {
            FilterValue::None => 0,
            FilterValue::Scalar(_) => 1,
            FilterValue::List(values) => values.len(),
            FilterValue::Range(..) => 2,
        }
    }
}

fn shape_mismatch(clause: &FilterClause) -> Error {
    let expected = match clause.op {
        FilterOp::IsNull => "0",
        FilterOp::In => "at least 1",
        FilterOp::Between => "2",
        _ => "1",
    };
    Error::ArityMismatch {
        op: clause.op,
        expected,
        got: clause.value.arity(),
    }
}

fn clause_to_node(clause: &FilterClause) -> Result<Predicate, Error> {
    let field = clause.field.clone();
    let compare = |op: CompareOperator, value: &Value| Predicate::Compare {
        field: clause.field.clone(),
        op,
        value: value.clone(),
    };

    Ok(match (&clause.op, &clause.value) {
        (FilterOp::Eq, FilterValue::Scalar(v)) => compare(CompareOperator::Eq, v),
        (FilterOp::Ne, FilterValue::Scalar(v)) => compare(CompareOperator::Ne, v),
        (FilterOp::Gt, FilterValue::Scalar(v)) => compare(CompareOperator::Gt, v),
        (FilterOp::Gte, FilterValue::Scalar(v)) => compare(CompareOperator::Ge, v),
        (FilterOp::Lt, FilterValue::Scalar(v)) => compare(CompareOperator::Lt, v),
        (FilterOp::Lte, FilterValue::Scalar(v)) => compare(CompareOperator::Le, v),
        (FilterOp::Contains, FilterValue::Scalar(Value::String(s))) => Predicate::Contains {
            field,
            needle: s.clone(),
        },
        (FilterOp::Contains, FilterValue::Scalar(_)) => {
            return Err(Error::OperatorNotApplicable {
                op: FilterOp::Contains,
                field,
            })
        }
        (FilterOp::In, FilterValue::List(values)) if !values.is_empty() => Predicate::In {
            field,
            values: values.clone(),
        },
        (FilterOp::Between, FilterValue::Range(low, high)) => Predicate::Between {
            field,
            low: low.clone(),
            high: high.clone(),
        },
        (FilterOp::IsNull, FilterValue::None) => Predicate::IsNull { field },
        _ => return Err(shape_mismatch(clause)),
    })
}

/// AND-combine clauses into a [`Predicate`]. No clauses → match everything.
///
/// A clause whose value does not fit its operator is rejected, so hand-built
/// clauses get the same guarantee as resolver output.
pub fn build_predicate(clauses: &[FilterClause]) -> Result<Predicate, Error> {
    clauses
        .iter()
        .map(clause_to_node)
        .collect::<Result<_, _>>()
        .map(Predicate::All)
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod filter_tests;
