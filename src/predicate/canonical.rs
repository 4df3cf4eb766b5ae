//! Stable structural keying for predicates.
//!
//! `canonical_key` produces a string key equal for two predicates that
//! are structurally equal modulo child order inside `And`/`Or` (children
//! are sorted by their own key first). Used by the OR handler to find
//! the conjuncts common to every DNF disjunct.

use super::ast::{CompareOp, ComparePredicate, Predicate};
use crate::expr::Expression;
use crate::value::Literal;

#[must_use]
pub fn canonical_key(predicate: &Predicate) -> String {
    match predicate {
        Predicate::Constant(value) => format!("const:{value}"),
        Predicate::Comparison(cmp) => compare_key(cmp),
        Predicate::Not(inner) => format!("not({})", canonical_key(inner)),
        Predicate::And(children) => wrap("and", children),
        Predicate::Or(children) => wrap("or", children),
    }
}

fn wrap(tag: &str, children: &[Predicate]) -> String {
    let mut keys: Vec<String> = children.iter().map(canonical_key).collect();
    keys.sort();
    format!("{tag}({})", keys.join(","))
}

fn compare_key(cmp: &ComparePredicate) -> String {
    format!(
        "cmp({};{};{})",
        op_key(cmp.op),
        expr_key(&cmp.left),
        expr_key(&cmp.right)
    )
}

fn op_key(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "eq",
        CompareOp::Ne => "ne",
        CompareOp::Lt => "lt",
        CompareOp::Lte => "lte",
        CompareOp::Gt => "gt",
        CompareOp::Gte => "gte",
        CompareOp::In => "in",
        CompareOp::NotIn => "not_in",
        CompareOp::ArrayContains => "array_contains",
        CompareOp::ArrayContainsAny => "array_contains_any",
    }
}

fn expr_key(expr: &Expression) -> String {
    match expr {
        Expression::Field(field) => format!("field({}.{})", field.alias, field.path.dotted()),
        Expression::Literal(literal) => format!("lit({})", literal_key(literal)),
        Expression::Param(name) => format!("param({name})"),
        Expression::List(items) => {
            let mut keys: Vec<String> = items.iter().map(expr_key).collect();
            keys.sort();
            format!("list({})", keys.join(","))
        }
    }
}

fn literal_key(literal: &Literal) -> String {
    match literal {
        Literal::Null => "null".to_string(),
        Literal::Bool(value) => format!("bool:{value}"),
        Literal::Number(value) => format!("num:{}", value.to_bits()),
        Literal::String(value) => format!("str:{value:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Field;

    fn cmp(field: &str, op: CompareOp, value: Literal) -> Predicate {
        Predicate::compare(op, Expression::Field(Field::parse(field).unwrap()), Expression::Literal(value))
    }

    #[test]
    fn equal_modulo_and_child_order() {
        let a = cmp("u.a", CompareOp::Eq, Literal::Bool(true));
        let b = cmp("u.b", CompareOp::Eq, Literal::Bool(true));
        let left = Predicate::And(vec![a.clone(), b.clone()]);
        let right = Predicate::And(vec![b, a]);
        assert_eq!(canonical_key(&left), canonical_key(&right));
    }

    #[test]
    fn distinguishes_different_predicates() {
        let a = cmp("u.a", CompareOp::Eq, Literal::Bool(true));
        let b = cmp("u.a", CompareOp::Eq, Literal::Bool(false));
        assert_ne!(canonical_key(&a), canonical_key(&b));
    }
}
