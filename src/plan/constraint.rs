//! Push-down constraint unit.

use crate::expr::Field;
use crate::predicate::ast::CompareOp;
use crate::value::Literal;

///
/// ConstraintValue
///
/// Lists appear only when `op` is `In`, `NotIn`, or `ArrayContainsAny`.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintValue {
    Literal(Literal),
    List(Vec<Literal>),
}

///
/// Constraint
///
/// `{field, op, value}` — a single push-down unit the backing store can
/// evaluate natively.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub field: Field,
    pub op: CompareOp,
    pub value: ConstraintValue,
}
