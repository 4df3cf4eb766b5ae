//! OR handling: DNF union vs. common-factor, cost-driven.
//!
//! A top-level disjunction can be planned two ways: as a `Union` of
//! per-disjunct scans, or by factoring out the conjuncts shared by every
//! disjunct into one scan with the residual disjunction evaluated as a
//! filter above it. `plan_or` computes both and keeps the cheaper one
//! unless a hint forces a specific shape.

use crate::catalog::IndexCatalog;
use crate::config::PlannerConfig;
use crate::error::PlanningError;
use crate::expr::Alias;
use crate::plan::node::{DistinctStrategy, ExecutionNode, UnionNode};
use crate::plan::orchestrate::build_base_plan;
use crate::predicate::ast::Predicate;
use crate::predicate::canonical::canonical_key;
use crate::predicate::dnf::to_dnf;
use crate::predicate::normalize::simplify;
use crate::projection::{Collection, Hints, JoinHint, OrderBySpec, PredicateMode, PredicateOrMode};
use crate::split;
use std::collections::{BTreeMap, HashSet};

/// Plan `predicate` across every source in `collections`, handling any
/// top-level disjunction per `hints`. Predicates without a top-level
/// `Or` (after `PredicateMode::Respect` bypasses rewriting entirely)
/// fall straight through to [`build_base_plan`].
pub(crate) fn plan_or(
    collections: &BTreeMap<Alias, Collection>,
    predicate: &Predicate,
    order_by: &[OrderBySpec],
    catalog: &IndexCatalog,
    config: &PlannerConfig,
    hints: &Hints,
) -> Result<(ExecutionNode, u32), PlanningError> {
    if matches!(hints.predicate_mode, PredicateMode::Respect) {
        return build_base_plan(collections, predicate, order_by, catalog, config, hints.join);
    }

    if !matches!(predicate, Predicate::Or(_)) {
        return build_base_plan(collections, predicate, order_by, catalog, config, hints.join);
    }

    let dnf = to_dnf(predicate);
    let Predicate::Or(disjuncts) = &dnf else {
        return build_base_plan(collections, &dnf, order_by, catalog, config, hints.join);
    };

    let aliases: Vec<Alias> = collections.keys().cloned().collect();

    match hints.predicate_or_mode {
        PredicateOrMode::Union => build_union(collections, disjuncts, order_by, catalog, config, hints.join, &aliases),
        PredicateOrMode::SingleScan => build_common_factor(collections, disjuncts, order_by, catalog, config, hints.join),
        PredicateOrMode::Auto => {
            let union = build_union(collections, disjuncts, order_by, catalog, config, hints.join, &aliases)?;
            let common_factor = build_common_factor(collections, disjuncts, order_by, catalog, config, hints.join)?;
            Ok(if union.1 <= common_factor.1 { union } else { common_factor })
        }
    }
}

/// One scan (or join tree) per disjunct, unioned with document-path
/// dedup so a document matched by more than one branch is never
/// double-counted.
fn build_union(
    collections: &BTreeMap<Alias, Collection>,
    disjuncts: &[Predicate],
    order_by: &[OrderBySpec],
    catalog: &IndexCatalog,
    config: &PlannerConfig,
    join_hint: JoinHint,
    aliases: &[Alias],
) -> Result<(ExecutionNode, u32), PlanningError> {
    let mut inputs = Vec::with_capacity(disjuncts.len());
    let mut total_cost = 0u32;
    let mut any_join = false;

    for disjunct in disjuncts {
        let (node, cost) = build_base_plan(collections, disjunct, order_by, catalog, config, join_hint)?;
        total_cost = total_cost.saturating_add(cost);
        if !split::split(disjunct, aliases).join_predicates.is_empty() {
            any_join = true;
        }
        inputs.push(node);
    }

    let penalty = if any_join {
        config.or_union_join_penalty
    } else {
        config.or_union_scan_penalty
    };
    let extra = u32::try_from(disjuncts.len().saturating_sub(1)).unwrap_or(u32::MAX);
    total_cost = total_cost.saturating_add(penalty.saturating_mul(extra));

    let node = ExecutionNode::Union(UnionNode {
        inputs,
        distinct_strategy: DistinctStrategy::DocPath,
    });

    Ok((node, total_cost))
}

/// Factor the conjuncts common to every disjunct out of the `Or`,
/// planning the factor plus the (now smaller) residual disjunction as a
/// single non-disjunctive predicate.
fn build_common_factor(
    collections: &BTreeMap<Alias, Collection>,
    disjuncts: &[Predicate],
    order_by: &[OrderBySpec],
    catalog: &IndexCatalog,
    config: &PlannerConfig,
    join_hint: JoinHint,
) -> Result<(ExecutionNode, u32), PlanningError> {
    let common = common_conjuncts(disjuncts);
    let common_keys: HashSet<String> = common.iter().map(canonical_key).collect();

    let residual_disjuncts: Vec<Predicate> = disjuncts.iter().map(|d| remove_conjuncts(d, &common_keys)).collect();
    let residual_or = simplify(&Predicate::Or(residual_disjuncts));

    let common_factor = match common.len() {
        0 => Predicate::Constant(true),
        1 => common.into_iter().next().unwrap_or(Predicate::Constant(true)),
        _ => Predicate::And(common),
    };
    let combined = simplify(&(common_factor & residual_or));

    let (node, cost) = build_base_plan(collections, &combined, order_by, catalog, config, join_hint)?;
    let penalty = config.or_common_factor_penalty.saturating_mul(u32::try_from(disjuncts.len()).unwrap_or(u32::MAX));

    Ok((node, cost.saturating_add(penalty)))
}

fn common_conjuncts(disjuncts: &[Predicate]) -> Vec<Predicate> {
    let mut iter = disjuncts.iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut common = flatten_and(first);
    for other in iter {
        let other_keys: HashSet<String> = flatten_and(other).iter().map(canonical_key).collect();
        common.retain(|conjunct| other_keys.contains(&canonical_key(conjunct)));
    }
    common
}

fn remove_conjuncts(predicate: &Predicate, common_keys: &HashSet<String>) -> Predicate {
    let remaining: Vec<Predicate> = flatten_and(predicate)
        .into_iter()
        .filter(|conjunct| !common_keys.contains(&canonical_key(conjunct)))
        .collect();

    match remaining.len() {
        0 => Predicate::Constant(true),
        1 => remaining.into_iter().next().unwrap_or(Predicate::Constant(true)),
        _ => Predicate::And(remaining),
    }
}

fn flatten_and(predicate: &Predicate) -> Vec<Predicate> {
    match predicate {
        Predicate::And(children) => children.iter().flat_map(flatten_and).collect(),
        Predicate::Constant(true) => Vec::new(),
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
        Predicate::compare(op, Expression::Field(Field::parse(field).unwrap()), Expression::Literal(value))
    }

    fn single_source() -> BTreeMap<Alias, Collection> {
        let mut from = BTreeMap::new();
        from.insert(Alias::from("u"), Collection::new(vec!["users".into()]));
        from
    }

    #[test]
    fn auto_mode_unions_independent_branches() {
        use crate::catalog::{IndexDef, IndexFieldSpec, IndexScope};
        use crate::projection::Direction;

        let predicate = Predicate::Or(vec![
            cmp("u.country", CompareOp::Eq, Literal::String("FR".into())),
            cmp("u.country", CompareOp::Eq, Literal::String("DE".into())),
        ]);
        let hints = Hints::default();
        let catalog = IndexCatalog::new(vec![IndexDef {
            collection_group: "users".into(),
            scope: IndexScope::Collection,
            fields: vec![IndexFieldSpec::new(vec!["country".into()], Direction::Asc)],
        }]);
        let (node, _cost) = plan_or(&single_source(), &predicate, &[], &catalog, &PlannerConfig::default(), &hints)
            .unwrap();

        assert!(matches!(node, ExecutionNode::Union(_)));
    }

    #[test]
    fn common_factor_extracted_when_branches_share_a_conjunct() {
        let shared = cmp("u.status", CompareOp::Eq, Literal::String("active".into()));
        let predicate = Predicate::Or(vec![
            Predicate::And(vec![shared.clone(), cmp("u.tier", CompareOp::Eq, Literal::String("gold".into()))]),
            Predicate::And(vec![shared, cmp("u.tier", CompareOp::Eq, Literal::String("silver".into()))]),
        ]);
        let mut hints = Hints::default();
        hints.predicate_or_mode = PredicateOrMode::SingleScan;

        let (node, _cost) = plan_or(
            &single_source(),
            &predicate,
            &[],
            &IndexCatalog::default(),
            &PlannerConfig::default(),
            &hints,
        )
        .unwrap();

        assert!(!matches!(node, ExecutionNode::Union(_)));
    }

    #[test]
    fn respect_mode_skips_dnf_rewrite_entirely() {
        let predicate = Predicate::Or(vec![
            cmp("u.country", CompareOp::Eq, Literal::String("FR".into())),
            cmp("u.country", CompareOp::Eq, Literal::String("DE".into())),
        ]);
        let mut hints = Hints::default();
        hints.predicate_mode = PredicateMode::Respect;

        let (node, _cost) = plan_or(
            &single_source(),
            &predicate,
            &[],
            &IndexCatalog::default(),
            &PlannerConfig::default(),
            &hints,
        )
        .unwrap();

        assert!(matches!(node, ExecutionNode::Filter(_)));
    }
}
