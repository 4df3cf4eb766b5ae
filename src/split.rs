//! Predicate splitter.
//!
//! Partitions a conjunction into source-local, join, and residual parts
//! across N aliases, building on the same AND-flattening `normalize`
//! already performs and extending it with an alias-involvement
//! dispatch.

use crate::expr::{Alias, Expression};
use crate::predicate::ast::Predicate;
use crate::predicate::normalize::simplify;
use std::collections::{BTreeMap, BTreeSet};

///
/// SplitResult
///

#[derive(Clone, Debug, Default)]
pub struct SplitResult {
    pub source_predicates: BTreeMap<Alias, Predicate>,
    pub join_predicates: Vec<Predicate>,
    pub residual_predicates: Vec<Predicate>,
}

/// Partition `predicate` into source-local, join, and residual buckets.
///
/// Algorithm: flatten into top-level conjuncts after
/// `simplify`. For each conjunct, compute its involved aliases and
/// dispatch:
/// - involved = {} -> residual
/// - involved = {a} -> `source_predicates[a] &= conjunct`
/// - involved >= 2 aliases and the conjunct is a pure comparison or an
///   `And` of such -> join predicate
/// - otherwise (multi-alias `Or`/`Not`) -> residual
#[must_use]
pub fn split(predicate: &Predicate, aliases: &[Alias]) -> SplitResult {
    let mut result = SplitResult::default();

    for conjunct in flatten_and(&simplify(predicate)) {
        let involved = get_involved_sources(&conjunct, aliases);

        match involved.len() {
            0 => result.residual_predicates.push(conjunct),
            1 => {
                let alias = involved.into_iter().next().expect("length checked above");
                let entry = result.source_predicates.remove(&alias);
                let combined = match entry {
                    Some(existing) => simplify(&(existing & conjunct)),
                    None => conjunct,
                };
                result.source_predicates.insert(alias, combined);
            }
            _ if is_pure_comparison_conjunction(&conjunct) => {
                result.join_predicates.push(conjunct);
            }
            _ => result.residual_predicates.push(conjunct),
        }
    }

    result
}

fn flatten_and(predicate: &Predicate) -> Vec<Predicate> {
    match predicate {
        Predicate::And(children) => children.iter().flat_map(flatten_and).collect(),
        Predicate::Constant(true) => Vec::new(),
        other => vec![other.clone()],
    }
}

/// The subset of `aliases` appearing anywhere in `predicate`.
#[must_use]
pub fn get_involved_sources(predicate: &Predicate, aliases: &[Alias]) -> BTreeSet<Alias> {
    let mut found = BTreeSet::new();
    walk_predicate(predicate, &mut found);
    found.retain(|alias| aliases.contains(alias));
    found
}

fn walk_predicate(predicate: &Predicate, found: &mut BTreeSet<Alias>) {
    match predicate {
        Predicate::Constant(_) => {}
        Predicate::Comparison(cmp) => {
            walk_expr(&cmp.left, found);
            walk_expr(&cmp.right, found);
        }
        Predicate::Not(inner) => walk_predicate(inner, found),
        Predicate::And(children) | Predicate::Or(children) => {
            for child in children {
                walk_predicate(child, found);
            }
        }
    }
}

fn walk_expr(expr: &Expression, found: &mut BTreeSet<Alias>) {
    match expr {
        Expression::Field(field) => {
            found.insert(field.alias.clone());
        }
        Expression::Literal(_) | Expression::Param(_) => {}
        Expression::List(items) => {
            for item in items {
                walk_expr(item, found);
            }
        }
    }
}

fn is_pure_comparison_conjunction(predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Comparison(_) => true,
        Predicate::And(children) => children.iter().all(is_pure_comparison_conjunction),
        Predicate::Constant(_) | Predicate::Or(_) | Predicate::Not(_) => false,
    }
}
