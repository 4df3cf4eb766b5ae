//! Normalize a predicate into a canonical, deterministic form.
//!
//! Normalization guarantees:
//! - logical equivalence is preserved
//! - nested `And`/`Or` are flattened
//! - neutral elements (`Constant(true)`/`Constant(false)`) are dropped
//!   or short-circuit as appropriate
//! - `Not(Not(x))` collapses to `x`; `Not(Constant(b))` to `Constant(!b)`
//! - the pass is idempotent: `simplify(simplify(p)) == simplify(p)`

use super::ast::Predicate;

#[must_use]
pub fn simplify(predicate: &Predicate) -> Predicate {
    match predicate {
        Predicate::Constant(_) | Predicate::Comparison(_) => predicate.clone(),
        Predicate::And(children) => simplify_and(children),
        Predicate::Or(children) => simplify_or(children),
        Predicate::Not(inner) => simplify_not(inner),
    }
}

fn simplify_and(children: &[Predicate]) -> Predicate {
    let mut flat = Vec::with_capacity(children.len());

    for child in children {
        match simplify(child) {
            Predicate::Constant(false) => return Predicate::Constant(false),
            Predicate::Constant(true) => {}
            Predicate::And(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    match flat.len() {
        0 => Predicate::Constant(true),
        1 => flat.into_iter().next().unwrap_or(Predicate::Constant(true)),
        _ => Predicate::And(flat),
    }
}

fn simplify_or(children: &[Predicate]) -> Predicate {
    let mut flat = Vec::with_capacity(children.len());

    for child in children {
        match simplify(child) {
            Predicate::Constant(true) => return Predicate::Constant(true),
            Predicate::Constant(false) => {}
            Predicate::Or(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }

    match flat.len() {
        0 => Predicate::Constant(false),
        1 => flat.into_iter().next().unwrap_or(Predicate::Constant(false)),
        _ => Predicate::Or(flat),
    }
}

fn simplify_not(inner: &Predicate) -> Predicate {
    match simplify(inner) {
        Predicate::Constant(value) => Predicate::Constant(!value),
        Predicate::Not(double) => simplify(&double),
        other => Predicate::Not(Box::new(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expression, Field};
    use crate::predicate::ast::CompareOp;
    use crate::value::Literal;

    fn cmp(field: &str, op: CompareOp, value: Literal) -> Predicate {
        Predicate::compare(
            op,
            Expression::Field(Field::parse(field).unwrap()),
            Expression::Literal(value),
        )
    }

    #[test]
    fn flattens_nested_and() {
        let p = Predicate::And(vec![
            cmp("u.age", CompareOp::Gt, Literal::Number(18.0)),
            Predicate::And(vec![cmp("u.country", CompareOp::Eq, Literal::String("FR".into()))]),
        ]);
        assert_eq!(
            simplify(&p),
            Predicate::And(vec![
                cmp("u.age", CompareOp::Gt, Literal::Number(18.0)),
                cmp("u.country", CompareOp::Eq, Literal::String("FR".into())),
            ])
        );
    }

    #[test]
    fn and_short_circuits_on_false() {
        let p = Predicate::And(vec![Predicate::Constant(true), Predicate::Constant(false)]);
        assert_eq!(simplify(&p), Predicate::Constant(false));
    }

    #[test]
    fn double_negation_collapses() {
        let p = Predicate::Not(Box::new(Predicate::Not(Box::new(Predicate::Constant(true)))));
        assert_eq!(simplify(&p), Predicate::Constant(true));
    }

    #[test]
    fn idempotent() {
        let p = Predicate::Or(vec![
            Predicate::And(vec![Predicate::Constant(true), cmp("a.x", CompareOp::Eq, Literal::Bool(true))]),
            Predicate::Constant(false),
        ]);
        let once = simplify(&p);
        let twice = simplify(&once);
        assert_eq!(once, twice);
    }
}
