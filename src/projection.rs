//! Input API surface.
//!
//! `Projection` is the abstract data the planner accepts; consumers
//! build it via whatever ergonomic builder they like — surface syntax
//! (parsing a query language, macro sugar, ...) lives elsewhere and
//! hands the planner plain data.

use crate::expr::{Alias, Field};
use crate::predicate::ast::Predicate;
use crate::value::Literal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

///
/// Direction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

///
/// Collection
///
/// A path built from literal segments (`"users/42/orders"`), optionally
/// marked as a collection-group scan (every collection sharing the leaf
/// name, at any depth).
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub segments: Vec<String>,
    pub collection_group: bool,
}

impl Collection {
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self {
            segments,
            collection_group: false,
        }
    }

    #[must_use]
    pub fn collection_group(leaf: impl Into<String>) -> Self {
        Self {
            segments: vec![leaf.into()],
            collection_group: true,
        }
    }

    /// The name used to match against a declared index's
    /// `collection_group` (the leaf segment either way).
    #[must_use]
    pub fn group_name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    #[must_use]
    pub fn path(&self) -> String {
        self.segments.join("/")
    }
}

///
/// OrderBySpec
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OrderBySpec {
    pub field: Field,
    pub direction: Direction,
}

///
/// JoinHint
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum JoinHint {
    Auto,
    Hash,
    Merge,
    IndexedNestedLoop,
    NestedLoop,
}

impl Default for JoinHint {
    fn default() -> Self {
        Self::Auto
    }
}

///
/// PredicateMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PredicateMode {
    Auto,
    Respect,
}

impl Default for PredicateMode {
    fn default() -> Self {
        Self::Auto
    }
}

///
/// PredicateOrMode
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum PredicateOrMode {
    Auto,
    Union,
    SingleScan,
}

impl Default for PredicateOrMode {
    fn default() -> Self {
        Self::Auto
    }
}

///
/// Hints
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Hints {
    pub join: JoinHint,
    pub predicate_mode: PredicateMode,
    pub predicate_or_mode: PredicateOrMode,
}

///
/// Projection
///
/// The declarative query input: a named set of sources, an optional
/// where-predicate, ordering, limit/offset, an optional select map, and
/// planning hints.
///

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Projection {
    pub from: BTreeMap<Alias, Collection>,
    pub where_predicate: Option<Predicate>,
    pub order_by: Vec<OrderBySpec>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub select: Option<BTreeMap<Alias, crate::expr::Expression>>,
    pub hints: Hints,
}

impl Projection {
    #[must_use]
    pub fn new(from: BTreeMap<Alias, Collection>) -> Self {
        Self {
            from,
            where_predicate: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            select: None,
            hints: Hints::default(),
        }
    }
}

///
/// ParamValue
///
/// A runtime parameter value as the caller hands it in: one of a small
/// set of legal primitives (string, number, boolean, null). Kept as a
/// dedicated type rather than `serde_json::Value` so
/// `ParameterTypeUnsupported` has a real, reachable failure mode at the
/// edge, where parsing happens and fails loudly rather than later during
/// planning.
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl From<ParamValue> for Literal {
    fn from(value: ParamValue) -> Self {
        match value {
            ParamValue::Null => Self::Null,
            ParamValue::Bool(value) => Self::Bool(value),
            ParamValue::Number(value) => Self::Number(value),
            ParamValue::String(value) => Self::String(value),
        }
    }
}

#[cfg(feature = "json-params")]
impl TryFrom<serde_json::Value> for ParamValue {
    type Error = PlanningError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Null => Ok(Self::Null),
            serde_json::Value::Bool(value) => Ok(Self::Bool(value)),
            serde_json::Value::Number(value) => value
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| PlanningError::ParameterTypeUnsupported(value.to_string())),
            serde_json::Value::String(value) => Ok(Self::String(value)),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(PlanningError::ParameterTypeUnsupported(value.to_string()))
            }
        }
    }
}
