//! Predicate AST.
//!
//! Pure, schema-agnostic representation of query predicates. This layer
//! contains no field-alias validation, index logic, or execution
//! semantics — all of that lives in later passes (split, plan).
//!
//! Comparisons carry alias-qualified `Expression`s on both sides so a
//! predicate can span more than one source.

use crate::expr::Expression;
use serde::{Deserialize, Serialize};

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    NotIn,
    ArrayContains,
    ArrayContainsAny,
}

impl CompareOp {
    /// Set-membership ops. At most one of these may be pushed into a
    /// single scan.
    #[must_use]
    pub const fn is_set_membership(self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::ArrayContainsAny)
    }

    /// Inequality ops. At most one distinct field may carry one of
    /// these in a single scan.
    #[must_use]
    pub const fn is_inequality(self) -> bool {
        matches!(
            self,
            Self::Lt | Self::Lte | Self::Gt | Self::Gte | Self::Ne | Self::NotIn
        )
    }
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComparePredicate {
    pub op: CompareOp,
    pub left: Expression,
    pub right: Expression,
}

///
/// Predicate
///

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    Constant(bool),
    Comparison(ComparePredicate),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Self {
        Self::Comparison(ComparePredicate { op, left, right })
    }

    #[must_use]
    pub const fn is_constant_true(&self) -> bool {
        matches!(self, Self::Constant(true))
    }

    #[must_use]
    pub const fn is_constant_false(&self) -> bool {
        matches!(self, Self::Constant(false))
    }
}

impl std::ops::BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl std::ops::BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}
