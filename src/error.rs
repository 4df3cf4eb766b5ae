//! Structured planning failures.
//!
//! All planning failures are values, not control-flow exceptions: one
//! `thiserror`-derived enum with a message per variant, named after the
//! offending field/value rather than a generic "invalid" string.

use crate::predicate::ast::CompareOp;
use thiserror::Error as ThisError;

///
/// PlanningError
///
/// Every kind a call to `Planner::plan` can fail with. Errors surface
/// synchronously and abort the current call; the planner never mutates
/// shared state before failing and never partially adopts a scan
/// ordering on failure.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PlanningError {
    #[error("projection has zero sources")]
    NoSources,

    #[error("field references unknown alias '{0}'")]
    UnknownAlias(String),

    #[error("field path '{0}' has no alias prefix")]
    FieldMissingAlias(String),

    #[error("parameter '{0}' was referenced but not supplied")]
    ParameterMissing(String),

    #[error("parameter '{0}' has an unsupported value type")]
    ParameterTypeUnsupported(String),

    #[error(
        "scan would require pushing down more than one inequality field: {}",
        .0.join(", ")
    )]
    MultipleInequalityFields(Vec<String>),

    #[error("order-by's leading field must match the scan's inequality field")]
    OrderByMustMatchInequalityField,

    #[error("forced join strategy {0:?} is not compatible with this join condition")]
    JoinHintIncompatible(JoinStrategyKind),

    #[error("malformed order-by entry: {0}")]
    InvalidOrderBySpec(String),

    #[error("expression has no planning interpretation")]
    UnsupportedExpression,
}

/// Lightweight mirror of `plan::node::JoinStrategy`, kept error-local so
/// `error` does not need to depend on `plan` for a debug label.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinStrategyKind {
    Hash,
    Merge,
    IndexedNestedLoop,
    NestedLoop,
}

impl PlanningError {
    #[must_use]
    pub fn multiple_inequality_fields(mut fields: Vec<String>) -> Self {
        fields.sort();
        fields.dedup();
        Self::MultipleInequalityFields(fields)
    }
}

/// Invalid operator appears where a join key equality or ordering
/// operator was expected (e.g. attempting to invert a set-membership
/// op). Not part of `PlanningError` since it is an internal-logic
/// error: callers should never be able to trigger it, same split as the
/// teacher's `InternalError` vs `PlanError` boundary.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ThisError)]
#[error("comparison operator {0:?} cannot be inverted")]
pub struct NotInvertible(pub CompareOp);
