//! Operator-level utilities used by the join planner: inverting a
//! comparison so a predicate can be re-oriented to the other side of a
//! join, and classifying a predicate as hash- or merge-join compatible.

use super::ast::{CompareOp, Predicate};
use crate::expr::Expression;

/// Swap operands of a comparison requires transforming the operator:
/// `<` <-> `>`, `<=` <-> `>=`, `==`/`!=` unchanged. Set-membership ops
/// cannot be inverted (the right-hand side is a list, not a peer field),
/// so this returns `None` for them.
#[must_use]
pub const fn invert_comparison(op: CompareOp) -> Option<CompareOp> {
    match op {
        CompareOp::Eq => Some(CompareOp::Eq),
        CompareOp::Ne => Some(CompareOp::Ne),
        CompareOp::Lt => Some(CompareOp::Gt),
        CompareOp::Gt => Some(CompareOp::Lt),
        CompareOp::Lte => Some(CompareOp::Gte),
        CompareOp::Gte => Some(CompareOp::Lte),
        CompareOp::In
        | CompareOp::NotIn
        | CompareOp::ArrayContains
        | CompareOp::ArrayContainsAny => None,
    }
}

/// `true` when `predicate` is a single `==` comparison between two
/// `Field`s, or an `And` of such comparisons. Hash join only needs
/// per-pair equality, so conjunctions of equalities are fine.
#[must_use]
pub fn is_hash_join_compatible(predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Comparison(cmp) => {
            cmp.op == CompareOp::Eq && is_field(&cmp.left) && is_field(&cmp.right)
        }
        Predicate::And(children) => {
            !children.is_empty() && children.iter().all(is_hash_join_compatible)
        }
        Predicate::Constant(_) | Predicate::Or(_) | Predicate::Not(_) => false,
    }
}

/// `true` when `predicate` is exactly one equality between two `Field`s.
/// Conjunctions are not merge-joinable directly in this design — a
/// merge join walks one ordered key per side.
#[must_use]
pub fn is_merge_join_compatible(predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Comparison(cmp) => {
            cmp.op == CompareOp::Eq && is_field(&cmp.left) && is_field(&cmp.right)
        }
        _ => false,
    }
}

fn is_field(expr: &Expression) -> bool {
    matches!(expr, Expression::Field(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverts_order_operators() {
        assert_eq!(invert_comparison(CompareOp::Lt), Some(CompareOp::Gt));
        assert_eq!(invert_comparison(CompareOp::Gte), Some(CompareOp::Lte));
        assert_eq!(invert_comparison(CompareOp::Eq), Some(CompareOp::Eq));
    }

    #[test]
    fn set_membership_cannot_invert() {
        assert_eq!(invert_comparison(CompareOp::In), None);
        assert_eq!(invert_comparison(CompareOp::ArrayContainsAny), None);
    }

    #[test]
    fn hash_join_allows_and_of_equalities() {
        use crate::expr::Field;
        let a_b = Predicate::compare(
            CompareOp::Eq,
            Expression::Field(Field::parse("a.id").unwrap()),
            Expression::Field(Field::parse("b.id").unwrap()),
        );
        let c_d = Predicate::compare(
            CompareOp::Eq,
            Expression::Field(Field::parse("a.region").unwrap()),
            Expression::Field(Field::parse("b.region").unwrap()),
        );
        assert!(is_hash_join_compatible(&Predicate::And(vec![a_b.clone(), c_d])));
        assert!(!is_merge_join_compatible(&Predicate::And(vec![a_b])));
    }
}
