//! Filter types for document queries.
//!
//! A [`Filter`] is a conjunction of [`FilterField`] conditions over
//! top-level document fields. Storage backends translate it to SQL or
//! evaluate it in memory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// `LIKE` pattern match (`%` and `_` wildcards).
    Like,
    /// Case-insensitive `LIKE`.
    ILike,
    /// List membership.
    In,
    /// Field is absent or null.
    IsNull,
    /// Field is present and not null.
    IsNotNull,
}

/// A dynamic filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
    /// A list of string values (for `In`).
    StringList(Vec<String>),
    /// No value (for `IsNull` / `IsNotNull`).
    Null,
}

impl FilterValue {
    /// The value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The value parsed as a UUID, if it is a UUID string.
    pub fn as_uuid(&self) -> Option<Uuid> {
        self.as_str().and_then(|s| Uuid::parse_str(s).ok())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// A single filter condition on a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// The document field to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: FilterValue,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Shorthand for an equality condition.
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOp::Eq, value)
    }

    /// Shorthand for a case-insensitive pattern condition.
    pub fn ilike(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOp::ILike, FilterValue::String(pattern.into()))
    }
}

/// A conjunction of conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter {
    /// All conditions; a document matches when every one holds.
    pub conditions: Vec<FilterField>,
}

impl Filter {
    /// A filter with no conditions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition.
    pub fn and(mut self, condition: FilterField) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an equality condition.
    pub fn eq(self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.and(FilterField::eq(field, value))
    }

    /// Add a condition with an explicit operator.
    pub fn with(
        self,
        field: impl Into<String>,
        op: FilterOp,
        value: impl Into<FilterValue>,
    ) -> Self {
        self.and(FilterField::new(field, op, value))
    }

    /// Conditions on the named field.
    pub fn conditions_on<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FilterField> {
        self.conditions.iter().filter(move |c| c.field == field)
    }

    /// Whether the filter has no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_conditions() {
        let company = Uuid::new_v4();
        let filter = Filter::new()
            .eq("company_id", company)
            .with("quantity", FilterOp::Gt, 5_i64);
        assert_eq!(filter.conditions.len(), 2);
        let tenant: Vec<_> = filter.conditions_on("company_id").collect();
        assert_eq!(tenant.len(), 1);
        assert_eq!(tenant[0].value.as_uuid(), Some(company));
    }

    #[test]
    fn test_non_uuid_string_is_not_a_uuid() {
        assert_eq!(FilterValue::from("not-a-uuid").as_uuid(), None);
        assert_eq!(FilterValue::Integer(3).as_uuid(), None);
    }
}
