//! Predicate / order → sea_orm compiler (AST in, SQL out).

use bigdecimal::{BigDecimal, ToPrimitive};
use query_core::ast::{CompareOperator, Predicate, Value};
use query_core::{FieldKind, FieldWhitelist, OrderSpec, SortDir};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Func, LikeExpr, Order, SimpleExpr},
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct Field<E: EntityTrait> {
    pub name: String,
    pub col: E::Column,
    pub kind: FieldKind,
}

/// Whitelisted API field name → entity column.
///
/// The map is the single source of truth for a resource: the engine's
/// [`FieldWhitelist`] is derived from it, so an accepted field always has a
/// column behind it.
#[derive(Clone, Debug)]
pub struct FieldMap<E: EntityTrait> {
    fields: Vec<Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        let name = api_name.into();
        self.fields.retain(|f| !f.name.eq_ignore_ascii_case(&name));
        self.fields.push(Field { name, col, kind });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field<E>> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn whitelist(&self) -> FieldWhitelist {
        self.fields
            .iter()
            .fold(FieldWhitelist::new(), |wl, f| wl.field(f.name.clone(), f.kind))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Raised when a predicate does not fit the field map. The engine only
/// builds predicates over whitelisted fields, so this signals a wiring bug
/// (whitelist and field map out of sync) rather than bad client input.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("type mismatch on '{field}': expected {expected}, got {got}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        got: &'static str,
    },

    #[error("value out of range for '{field}'")]
    OutOfRange { field: String },
}

pub type BuildResult<T> = Result<T, BuildError>;

/* ---------- coercion ---------- */

fn bigdecimal_to_decimal(bd: &BigDecimal) -> Option<Decimal> {
    let s = bd.normalized().to_string();
    Decimal::from_str_exact(&s).or_else(|_| s.parse::<Decimal>()).ok()
}

fn coerce<E: EntityTrait>(f: &Field<E>, v: &Value) -> BuildResult<sea_orm::Value> {
    let out_of_range = || BuildError::OutOfRange {
        field: f.name.clone(),
    };

    Ok(match (f.kind, v) {
        (FieldKind::String, Value::String(s)) => sea_orm::Value::String(Some(Box::new(s.clone()))),
        (FieldKind::I64, Value::Number(n)) => {
            sea_orm::Value::BigInt(Some(n.to_i64().ok_or_else(out_of_range)?))
        }
        (FieldKind::F64, Value::Number(n)) => {
            sea_orm::Value::Double(Some(n.to_f64().ok_or_else(out_of_range)?))
        }
        (FieldKind::Decimal, Value::Number(n)) => {
            sea_orm::Value::Decimal(Some(Box::new(bigdecimal_to_decimal(n).ok_or_else(out_of_range)?)))
        }
        (FieldKind::Bool, Value::Bool(b)) => sea_orm::Value::Bool(Some(*b)),
        (FieldKind::Uuid, Value::Uuid(u)) => sea_orm::Value::Uuid(Some(Box::new(*u))),
        (FieldKind::DateTimeUtc, Value::DateTime(dt)) => {
            sea_orm::Value::ChronoDateTimeUtc(Some(Box::new(*dt)))
        }
        (FieldKind::Date, Value::Date(d)) => sea_orm::Value::ChronoDate(Some(Box::new(*d))),
        (expected, other) => {
            return Err(BuildError::TypeMismatch {
                field: f.name.clone(),
                expected,
                got: other.type_name(),
            })
        }
    })
}

/* ---------- LIKE helpers ---------- */

const LIKE_ESCAPE: char = '\\';

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(ch);
    }
    out
}

/// Substring match that ignores ASCII case; `%`, `_` and `\` in the needle
/// are literal.
///
/// The needle is folded with ASCII rules only, matching SQLite's `LOWER()`.
/// Non-ASCII letters compare as stored on SQLite; PostgreSQL folds them in the
/// column, so non-ASCII needles must be given in lowercase there.
fn contains_expr(col: impl sea_orm::sea_query::IntoColumnRef, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", like_escape(&needle.to_ascii_lowercase()));
    Expr::expr(Func::lower(Expr::col(col))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

/* ---------- Predicate -> Condition ---------- */

fn lookup<'a, E: EntityTrait>(fmap: &'a FieldMap<E>, name: &str) -> BuildResult<&'a Field<E>> {
    fmap.get(name)
        .ok_or_else(|| BuildError::UnknownField(name.to_string()))
}

pub fn predicate_to_condition<E>(p: &Predicate, fmap: &FieldMap<E>) -> BuildResult<Condition>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    Ok(match p {
        Predicate::All(nodes) => {
            let mut cond = Condition::all();
            for n in nodes {
                cond = cond.add(predicate_to_condition(n, fmap)?);
            }
            cond
        }

        Predicate::Compare { field, op, value } => {
            let f = lookup(fmap, field)?;
            let v = coerce(f, value)?;
            let e = match op {
                CompareOperator::Eq => Expr::col(f.col).eq(v),
                CompareOperator::Ne => Expr::col(f.col).ne(v),
                CompareOperator::Gt => Expr::col(f.col).gt(v),
                CompareOperator::Ge => Expr::col(f.col).gte(v),
                CompareOperator::Lt => Expr::col(f.col).lt(v),
                CompareOperator::Le => Expr::col(f.col).lte(v),
            };
            Condition::all().add(e)
        }

        Predicate::Contains { field, needle } => {
            let f = lookup(fmap, field)?;
            if f.kind != FieldKind::String {
                return Err(BuildError::TypeMismatch {
                    field: f.name.clone(),
                    expected: FieldKind::String,
                    got: "non-string field",
                });
            }
            Condition::all().add(contains_expr(f.col, needle))
        }

        Predicate::In { field, values } => {
            let f = lookup(fmap, field)?;
            let vals = values
                .iter()
                .map(|v| coerce(f, v))
                .collect::<BuildResult<Vec<_>>>()?;
            if vals.is_empty() {
                // IN () → always false
                Condition::all().add(Expr::cust("1=0"))
            } else {
                Condition::all().add(Expr::col(f.col).is_in(vals))
            }
        }

        Predicate::Between { field, low, high } => {
            let f = lookup(fmap, field)?;
            Condition::all().add(Expr::col(f.col).between(coerce(f, low)?, coerce(f, high)?))
        }

        Predicate::IsNull { field } => {
            let f = lookup(fmap, field)?;
            Condition::all().add(Expr::col(f.col).is_null())
        }
    })
}

/* ---------- Select extensions ---------- */

pub trait PredicateExt<E: EntityTrait>: Sized {
    fn apply_predicate(self, p: &Predicate, fmap: &FieldMap<E>) -> BuildResult<Self>;
}

impl<E> PredicateExt<E> for sea_orm::Select<E>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    fn apply_predicate(self, p: &Predicate, fmap: &FieldMap<E>) -> BuildResult<Self> {
        if p.is_always() {
            return Ok(self);
        }
        Ok(self.filter(predicate_to_condition(p, fmap)?))
    }
}

pub trait OrderSpecExt<E: EntityTrait>: Sized {
    fn apply_order(self, order: &OrderSpec, fmap: &FieldMap<E>) -> BuildResult<Self>;
}

impl<E> OrderSpecExt<E> for sea_orm::Select<E>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    fn apply_order(self, order: &OrderSpec, fmap: &FieldMap<E>) -> BuildResult<Self> {
        let mut query = self;
        for key in order.iter() {
            let f = lookup(fmap, &key.field)?;
            let sea_order = match key.dir {
                SortDir::Asc => Order::Asc,
                SortDir::Desc => Order::Desc,
            };
            query = query.order_by(f.col, sea_order);
        }
        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_escape_makes_wildcards_literal() {
        assert_eq!(like_escape("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(like_escape("plain"), "plain");
    }

    #[test]
    fn bigdecimal_conversion_keeps_precision() {
        let bd: BigDecimal = "12.3400".parse().unwrap();
        assert_eq!(bigdecimal_to_decimal(&bd).unwrap().to_string(), "12.34");
    }
}
