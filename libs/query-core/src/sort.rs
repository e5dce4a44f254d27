use serde::{Deserialize, Serialize};

use crate::{Error, FieldWhitelist};

pub const MAX_SORT_LEN: usize = 1024;
pub const MAX_SORT_FIELDS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    /// Case-insensitive; anything other than `desc` is ascending.
    pub fn from_token(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("desc") {
            SortDir::Desc
        } else {
            SortDir::Asc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// One validated `field:direction` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortClause {
    pub field: String,
    pub dir: SortDir,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderKey {
    pub field: String,
    pub dir: SortDir,
}

/// Backend-agnostic ordering; position is precedence. Empty means "backend default".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderSpec(pub Vec<OrderKey>);

impl OrderSpec {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &OrderKey> {
        self.0.iter()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|k| k.field.eq_ignore_ascii_case(field))
    }

    /// Append `tiebreaker` as the lowest-precedence key unless already present,
    /// so that pages over equal sort keys stay deterministic.
    pub fn ensure_tiebreaker(mut self, tiebreaker: &str, dir: SortDir) -> Self {
        if !self.contains(tiebreaker) {
            self.0.push(OrderKey {
                field: tiebreaker.to_string(),
                dir,
            });
        }
        self
    }

    /// Compact `+a,-b` rendering, used in logs.
    pub fn to_signed_tokens(&self) -> String {
        self.0
            .iter()
            .map(|k| match k.dir {
                SortDir::Asc => format!("+{}", k.field),
                SortDir::Desc => format!("-{}", k.field),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Resolve raw sort expressions into validated clauses.
///
/// Each raw value is a comma-separated list of `field[:direction]`. Empty
/// segments are skipped, the first occurrence of a field wins, and an unknown
/// field fails the whole request.
pub fn resolve_sorting(raw: &[&str], whitelist: &FieldWhitelist) -> Result<Vec<SortClause>, Error> {
    let mut clauses: Vec<SortClause> = Vec::new();

    for value in raw {
        if value.len() > MAX_SORT_LEN {
            return Err(Error::InvalidSort("sort expression too long".into()));
        }

        for part in value.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (name, dir) = match part.split_once(':') {
                Some((name, dir)) => (name.trim(), SortDir::from_token(dir)),
                None => (part, SortDir::Asc),
            };
            if name.is_empty() {
                return Err(Error::InvalidSort(format!("empty field name in '{part}'")));
            }

            let field = whitelist
                .get(name)
                .ok_or_else(|| Error::UnknownSortField(name.to_string()))?;

            if clauses.iter().any(|c| c.field == field.name) {
                continue;
            }

            clauses.push(SortClause {
                field: field.name.clone(),
                dir,
            });

            if clauses.len() > MAX_SORT_FIELDS {
                return Err(Error::InvalidSort("too many sort fields".into()));
            }
        }
    }

    Ok(clauses)
}

/// Convert validated clauses into an [`OrderSpec`], preserving precedence.
pub fn build_order(clauses: &[SortClause]) -> OrderSpec {
    OrderSpec(
        clauses
            .iter()
            .map(|c| OrderKey {
                field: c.field.clone(),
                dir: c.dir,
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FieldKind;

    fn whitelist() -> FieldWhitelist {
        FieldWhitelist::new()
            .field("name", FieldKind::String)
            .field("created_at", FieldKind::DateTimeUtc)
            .field("size_bytes", FieldKind::I64)
    }

    #[test]
    fn parses_pairs_in_order() {
        let out = resolve_sorting(&["created_at:desc,name:asc"], &whitelist()).unwrap();
        assert_eq!(
            out,
            vec![
                SortClause {
                    field: "created_at".into(),
                    dir: SortDir::Desc
                },
                SortClause {
                    field: "name".into(),
                    dir: SortDir::Asc
                },
            ]
        );
    }

    #[test]
    fn direction_is_case_insensitive_and_defaults_to_asc() {
        let out = resolve_sorting(&["name:DeSc, size_bytes:sideways, created_at"], &whitelist())
            .unwrap();
        assert_eq!(out[0].dir, SortDir::Desc);
        assert_eq!(out[1].dir, SortDir::Asc);
        assert_eq!(out[2].dir, SortDir::Asc);
    }

    #[test]
    fn unknown_field_fails_whole_request() {
        let err = resolve_sorting(&["name:asc,password:desc"], &whitelist()).unwrap_err();
        assert_eq!(err, Error::UnknownSortField("password".into()));
    }

    #[test]
    fn first_duplicate_wins() {
        let out = resolve_sorting(&["name:desc", "NAME:asc,created_at"], &whitelist()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].field, "name");
        assert_eq!(out[0].dir, SortDir::Desc);
        assert_eq!(out[1].field, "created_at");
    }

    #[test]
    fn field_names_are_canonicalized() {
        let out = resolve_sorting(&["Created_At:desc"], &whitelist()).unwrap();
        assert_eq!(out[0].field, "created_at");
    }

    #[test]
    fn empty_input_means_default_order() {
        assert!(resolve_sorting(&[], &whitelist()).unwrap().is_empty());
        assert!(resolve_sorting(&["", " , "], &whitelist()).unwrap().is_empty());
        assert!(build_order(&[]).is_empty());
    }

    #[test]
    fn empty_field_name_is_rejected() {
        let err = resolve_sorting(&[":desc"], &whitelist()).unwrap_err();
        assert!(matches!(err, Error::InvalidSort(_)));
    }

    #[test]
    fn too_long_is_rejected() {
        let raw = "a".repeat(MAX_SORT_LEN + 1);
        let err = resolve_sorting(&[raw.as_str()], &whitelist()).unwrap_err();
        assert!(matches!(err, Error::InvalidSort(_)));
    }

    #[test]
    fn order_preserves_precedence_and_tiebreaker() {
        let clauses = resolve_sorting(&["size_bytes:desc,name"], &whitelist()).unwrap();
        let order = build_order(&clauses).ensure_tiebreaker("id", SortDir::Asc);
        assert_eq!(order.to_signed_tokens(), "-size_bytes,+name,+id");

        let order = order.ensure_tiebreaker("ID", SortDir::Desc);
        assert_eq!(order.len(), 3);
    }
}
