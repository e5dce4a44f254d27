use std::fmt;

/// Storage type of a whitelisted field; drives value coercion in the filtering resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    I64,
    F64,
    Decimal,
    Bool,
    Uuid,
    DateTimeUtc,
    Date,
}

impl FieldKind {
    #[inline]
    pub fn is_text(self) -> bool {
        matches!(self, FieldKind::String)
    }

    /// Whether `<`/`>` comparisons make sense for this kind.
    #[inline]
    pub fn is_ordered(self) -> bool {
        !matches!(self, FieldKind::Bool | FieldKind::Uuid)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::String => "string",
            FieldKind::I64 => "integer",
            FieldKind::F64 => "number",
            FieldKind::Decimal => "decimal",
            FieldKind::Bool => "boolean",
            FieldKind::Uuid => "uuid",
            FieldKind::DateTimeUtc => "RFC 3339 datetime",
            FieldKind::Date => "date (YYYY-MM-DD)",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistedField {
    /// Canonical API name, as registered.
    pub name: String,
    pub kind: FieldKind,
}

/// Ordered set of field names a resource exposes for sorting and filtering.
///
/// Lookups are case-insensitive and always return the canonical spelling, so
/// downstream builders only ever see registered names.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldWhitelist {
    fields: Vec<WhitelistedField>,
}

impl FieldWhitelist {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Register a field. Re-registering a name (ignoring case) replaces its kind
    /// but keeps its original position.
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        match self
            .fields
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(&name))
        {
            Some(existing) => existing.kind = kind,
            None => self.fields.push(WhitelistedField { name, kind }),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&WhitelistedField> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &WhitelistedField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
