//! Disjunctive Normal Form conversion.
//!
//! `to_dnf` pushes `NOT` through De Morgan until only atoms carry
//! negation, then distributes `AND` over `OR`. The result is either a
//! single atom/conjunction, or `Or(C1..Cn)` where each `Ci` is an atom or
//! an `And` of atoms — never a nested `Or` and never a `Not` above a
//! non-atom. Built in the same pure-recursive style as `normalize`.

use super::ast::Predicate;
use super::normalize::simplify;

#[must_use]
pub fn to_dnf(predicate: &Predicate) -> Predicate {
    let pushed = simplify(&push_not(&simplify(predicate)));
    distribute(&pushed)
}

fn push_not(predicate: &Predicate) -> Predicate {
    match predicate {
        Predicate::Not(inner) => match inner.as_ref() {
            Predicate::Constant(value) => Predicate::Constant(!value),
            Predicate::Not(doubled) => push_not(doubled),
            Predicate::And(children) => Predicate::Or(
                children
                    .iter()
                    .map(|child| push_not(&Predicate::Not(Box::new(child.clone()))))
                    .collect(),
            ),
            Predicate::Or(children) => Predicate::And(
                children
                    .iter()
                    .map(|child| push_not(&Predicate::Not(Box::new(child.clone()))))
                    .collect(),
            ),
            atom @ Predicate::Comparison(_) => Predicate::Not(Box::new(atom.clone())),
        },
        Predicate::And(children) => Predicate::And(children.iter().map(push_not).collect()),
        Predicate::Or(children) => Predicate::Or(children.iter().map(push_not).collect()),
        other => other.clone(),
    }
}

fn distribute(predicate: &Predicate) -> Predicate {
    match predicate {
        Predicate::And(children) => distribute_and(children),
        Predicate::Or(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.iter().map(distribute) {
                match child {
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
        other => other.clone(),
    }
}

/// AND distributes over OR via the cartesian product of each child's
/// disjuncts, flattening conjunction terms as it goes.
fn distribute_and(children: &[Predicate]) -> Predicate {
    let mut combinations: Vec<Vec<Predicate>> = vec![Vec::new()];

    for child in children {
        let distributed = distribute(child);
        let options = as_disjuncts(&distributed);

        let mut next = Vec::with_capacity(combinations.len() * options.len());
        for existing in &combinations {
            for option in &options {
                let mut combo = existing.clone();
                match option {
                    Predicate::And(inner) => combo.extend(inner.clone()),
                    other => combo.push(other.clone()),
                }
                next.push(combo);
            }
        }
        combinations = next;
    }

    let disjuncts: Vec<Predicate> = combinations
        .into_iter()
        .map(|terms| match terms.len() {
            0 => Predicate::Constant(true),
            1 => terms.into_iter().next().unwrap_or(Predicate::Constant(true)),
            _ => Predicate::And(terms),
        })
        .collect();

    match disjuncts.len() {
        0 => Predicate::Constant(false),
        1 => disjuncts.into_iter().next().unwrap_or(Predicate::Constant(false)),
        _ => Predicate::Or(disjuncts),
    }
}

fn as_disjuncts(predicate: &Predicate) -> Vec<Predicate> {
    match predicate {
        Predicate::Or(children) => children.clone(),
        other => vec![other.clone()],
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
    fn distributes_and_over_or() {
        // (a OR b) AND c  =>  (a AND c) OR (b AND c)
        let a = cmp("u.a", CompareOp::Eq, Literal::Bool(true));
        let b = cmp("u.b", CompareOp::Eq, Literal::Bool(true));
        let c = cmp("u.c", CompareOp::Eq, Literal::Bool(true));
        let p = Predicate::And(vec![Predicate::Or(vec![a.clone(), b.clone()]), c.clone()]);

        let dnf = to_dnf(&p);
        assert_eq!(
            dnf,
            Predicate::Or(vec![
                Predicate::And(vec![a, c.clone()]),
                Predicate::And(vec![b, c]),
            ])
        );
    }

    #[test]
    fn de_morgan_pushes_not_through_and() {
        let a = cmp("u.a", CompareOp::Eq, Literal::Bool(true));
        let b = cmp("u.b", CompareOp::Eq, Literal::Bool(true));
        let p = Predicate::Not(Box::new(Predicate::And(vec![a.clone(), b.clone()])));

        let dnf = to_dnf(&p);
        assert_eq!(
            dnf,
            Predicate::Or(vec![
                Predicate::Not(Box::new(a)),
                Predicate::Not(Box::new(b)),
            ])
        );
    }

    #[test]
    fn no_nested_or_or_not_above_atom() {
        fn assert_shape(p: &Predicate) {
            match p {
                Predicate::Or(children) => {
                    for child in children {
                        assert!(!matches!(child, Predicate::Or(_)));
                        assert_conjunction(child);
                    }
                }
                other => assert_conjunction(other),
            }
        }
        fn assert_conjunction(p: &Predicate) {
            match p {
                Predicate::And(children) => {
                    for child in children {
                        assert!(!matches!(child, Predicate::And(_) | Predicate::Or(_)));
                    }
                }
                Predicate::Or(_) => panic!("nested OR inside conjunction"),
                _ => {}
            }
        }

        let a = cmp("u.a", CompareOp::Eq, Literal::Bool(true));
        let b = cmp("u.b", CompareOp::Eq, Literal::Bool(true));
        let c = cmp("u.c", CompareOp::Eq, Literal::Bool(true));
        let p = Predicate::Or(vec![
            Predicate::And(vec![a, Predicate::Or(vec![b, c])]),
        ]);
        assert_shape(&to_dnf(&p));
    }
}
