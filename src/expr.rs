//! Canonical expression model: fields, literals, parameters, and
//! array-valued comparands.
//!
//! `Field` carries an explicit `alias` tag naming which source it
//! belongs to, since a projection can join several sources together. A
//! right-hand side is a closed tagged sum: `Literal`, `List`, `Field`,
//! or a not-yet-resolved `Param` — nothing else.

use crate::error::PlanningError;
use crate::value::Literal;
use derive_more::{Deref, From};
use serde::{Deserialize, Serialize};

///
/// Alias
///
/// The name a source is bound to in a projection's `from` map (e.g. `u`
/// in `from: {u: users}`). A thin newtype rather than a bare `String` so
/// alias-vs-field-name confusion is a type error, not a runtime one.
///

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deref, From, Serialize, Deserialize)]
pub struct Alias(pub String);

impl Alias {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Alias {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

///
/// FieldPath
///
/// Structured segment list for a field reference. Segments prefixed
/// with `#` address document metadata (`#id`, `#path`, `#collection`,
/// `#parent`); the planner preserves them verbatim and leaves
/// resolution to the executor.
///

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deref, Serialize, Deserialize)]
pub struct FieldPath(pub Vec<String>);

impl FieldPath {
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    #[must_use]
    pub fn is_metadata(&self) -> bool {
        self.0.first().is_some_and(|seg| seg.starts_with('#'))
    }

    #[must_use]
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

///
/// Field
///
/// An alias-qualified field reference. Fields always carry an alias;
/// there is no "current source" notion at this layer.
///

#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Field {
    pub alias: Alias,
    pub path: FieldPath,
}

impl Field {
    #[must_use]
    pub fn new(alias: impl Into<Alias>, path: Vec<String>) -> Self {
        Self {
            alias: alias.into(),
            path: FieldPath::new(path),
        }
    }

    /// Parse the edge-convenience string form `"alias.a.b"` into a
    /// structured `Field`. Parsing is an edge concern; the core never
    /// re-derives an alias from a bare path.
    pub fn parse(raw: &str) -> Result<Self, PlanningError> {
        let mut segments = raw.split('.');
        let alias = segments
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| PlanningError::FieldMissingAlias(raw.to_string()))?;
        let path: Vec<String> = segments.map(str::to_string).collect();
        if path.is_empty() {
            return Err(PlanningError::FieldMissingAlias(raw.to_string()));
        }

        Ok(Self::new(alias, path))
    }
}

///
/// Expression
///
/// Closed tagged sum for anything that can appear on either side of a
/// comparison. `List` is legal only as the right-hand side of a
/// set-membership operator; the planner rejects any other placement
/// with `PlanningError::UnsupportedExpression`.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Field(Field),
    Literal(Literal),
    Param(String),
    List(Vec<Expression>),
}

impl Expression {
    #[must_use]
    pub const fn as_field(&self) -> Option<&Field> {
        match self {
            Self::Field(field) => Some(field),
            Self::Literal(_) | Self::Param(_) | Self::List(_) => None,
        }
    }

    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Literal(literal) => Some(literal),
            Self::Field(_) | Self::Param(_) | Self::List(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_alias_from_path() {
        let field = Field::parse("u.address.city").unwrap();
        assert_eq!(field.alias, Alias::from("u"));
        assert_eq!(field.path, FieldPath::new(vec!["address".into(), "city".into()]));
    }

    #[test]
    fn parse_rejects_missing_alias() {
        assert_eq!(
            Field::parse("age"),
            Err(PlanningError::FieldMissingAlias("age".to_string()))
        );
    }

    #[test]
    fn parse_preserves_metadata_segment() {
        let field = Field::parse("u.#id").unwrap();
        assert!(field.path.is_metadata());
    }
}
