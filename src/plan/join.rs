//! Cost-based join ordering and strategy selection.
//!
//! Pure functions over borrowed inputs, no shared mutable state: build
//! a left-deep join tree from per-alias scan plans and the join
//! predicates that connect them, picking Hash/Merge/IndexedNestedLoop/
//! NestedLoop per pair by cost and catalog support.

use crate::catalog::IndexCatalog;
use crate::config::PlannerConfig;
use crate::error::{JoinStrategyKind, PlanningError};
use crate::expr::{Alias, Expression};
use crate::plan::node::{ExecutionNode, JoinStrategy};
use crate::plan::scan::ScanPlan;
use crate::predicate::ast::{CompareOp, Predicate};
use crate::predicate::ops::{invert_comparison, is_hash_join_compatible, is_merge_join_compatible};
use crate::projection::JoinHint;
use crate::split::get_involved_sources;
use std::collections::{BTreeMap, BTreeSet};

/// Build a left-deep join tree over `scan_plans`, combining sources in
/// ascending push-down cost order and picking, at each step, the
/// cheapest remaining source that carries a join predicate to the
/// accumulated set (falling back to a cross product only when none
/// does). Returns the combined node and its total cost.
pub fn build_join_tree(
    aliases: &[Alias],
    mut scan_plans: BTreeMap<Alias, ScanPlan>,
    mut join_predicates: Vec<Predicate>,
    join_hint: JoinHint,
    catalog: &IndexCatalog,
    config: &PlannerConfig,
) -> Result<(ExecutionNode, u32), PlanningError> {
    let mut order: Vec<Alias> = aliases.to_vec();
    order.sort_by_key(|alias| scan_plans.get(alias).map_or(u32::MAX, |plan| plan.cost));

    let mut remaining: Vec<Alias> = order;
    let first = remaining.remove(0);
    let first_plan = scan_plans.remove(&first).expect("scan plan exists for every alias");

    let mut accumulated: BTreeSet<Alias> = BTreeSet::from([first.clone()]);
    let mut node = first_plan.node;
    let mut cost = first_plan.cost;

    while !remaining.is_empty() {
        let pick = pick_next(&remaining, &accumulated, &join_predicates, &scan_plans);
        let alias = remaining.remove(pick);
        let mut plan = scan_plans.remove(&alias).expect("scan plan exists for every alias");

        let (connecting, leftover): (Vec<Predicate>, Vec<Predicate>) = join_predicates
            .into_iter()
            .partition(|p| connects(p, &accumulated, &alias));
        join_predicates = leftover;

        let condition = combine_and(connecting);
        let oriented = orient(&condition, &accumulated);
        let strategy = choose_strategy(&oriented, &mut node, &mut plan.node, join_hint, catalog)?;

        cost = cost.saturating_add(plan.cost).saturating_add(strategy_overhead(strategy));
        node = node.join(plan.node, strategy, oriented);
        accumulated.insert(alias);
    }

    if !join_predicates.is_empty() {
        let residual = combine_and(join_predicates);
        node = node.filter(residual);
        cost = cost.saturating_add(config.non_indexable_penalty);
    }

    Ok((node, cost))
}

fn pick_next(
    remaining: &[Alias],
    accumulated: &BTreeSet<Alias>,
    join_predicates: &[Predicate],
    scan_plans: &BTreeMap<Alias, ScanPlan>,
) -> usize {
    let mut best: Option<(bool, u32, usize)> = None;

    for (index, alias) in remaining.iter().enumerate() {
        let has_join = join_predicates.iter().any(|p| connects(p, accumulated, alias));
        let cost = scan_plans.get(alias).map_or(u32::MAX, |plan| plan.cost);
        let candidate = (!has_join, cost, index);
        if best.is_none_or(|current| candidate < current) {
            best = Some(candidate);
        }
    }

    best.map_or(0, |(_, _, index)| index)
}

fn connects(predicate: &Predicate, accumulated: &BTreeSet<Alias>, candidate: &Alias) -> bool {
    let mut universe: Vec<Alias> = accumulated.iter().cloned().collect();
    universe.push(candidate.clone());
    let involved = get_involved_sources(predicate, &universe);
    involved.contains(candidate) && involved.iter().any(|alias| accumulated.contains(alias))
}

fn combine_and(predicates: Vec<Predicate>) -> Predicate {
    match predicates.len() {
        0 => Predicate::Constant(true),
        1 => predicates.into_iter().next().unwrap_or(Predicate::Constant(true)),
        _ => Predicate::And(predicates),
    }
}

/// Orient each comparison so its left operand references an alias
/// already in `accumulated` and its right operand references the new
/// source, swapping operands (and inverting the operator) where the
/// predicate was written the other way around.
fn orient(predicate: &Predicate, accumulated: &BTreeSet<Alias>) -> Predicate {
    match predicate {
        Predicate::Comparison(cmp) => {
            let left_is_accumulated = cmp.left.as_field().is_some_and(|f| accumulated.contains(&f.alias));
            if left_is_accumulated {
                predicate.clone()
            } else if let Some(inverted) = invert_comparison(cmp.op) {
                Predicate::compare(inverted, cmp.right.clone(), cmp.left.clone())
            } else {
                predicate.clone()
            }
        }
        Predicate::And(children) => Predicate::And(children.iter().map(|c| orient(c, accumulated)).collect()),
        other => other.clone(),
    }
}

fn choose_strategy(
    condition: &Predicate,
    left: &mut ExecutionNode,
    right: &mut ExecutionNode,
    hint: JoinHint,
    catalog: &IndexCatalog,
) -> Result<JoinStrategy, PlanningError> {
    if condition.is_constant_true() {
        return match hint {
            JoinHint::Auto | JoinHint::NestedLoop => Ok(JoinStrategy::NestedLoop),
            _ => Err(PlanningError::JoinHintIncompatible(hint_kind(hint))),
        };
    }

    match hint {
        JoinHint::Merge => {
            if !is_merge_join_compatible(condition) {
                return Err(PlanningError::JoinHintIncompatible(JoinStrategyKind::Merge));
            }
            try_adopt_merge_sort(condition, left, right, catalog)
                .ok_or(PlanningError::JoinHintIncompatible(JoinStrategyKind::Merge))
        }
        JoinHint::Hash => {
            if is_hash_join_compatible(condition) {
                Ok(JoinStrategy::Hash)
            } else {
                Err(PlanningError::JoinHintIncompatible(JoinStrategyKind::Hash))
            }
        }
        JoinHint::IndexedNestedLoop => Ok(JoinStrategy::IndexedNestedLoop),
        JoinHint::NestedLoop => Ok(JoinStrategy::NestedLoop),
        JoinHint::Auto => Ok(auto_strategy(condition, left, right, catalog)),
    }
}

fn hint_kind(hint: JoinHint) -> JoinStrategyKind {
    match hint {
        JoinHint::Hash => JoinStrategyKind::Hash,
        JoinHint::Merge => JoinStrategyKind::Merge,
        JoinHint::IndexedNestedLoop => JoinStrategyKind::IndexedNestedLoop,
        JoinHint::Auto | JoinHint::NestedLoop => JoinStrategyKind::NestedLoop,
    }
}

fn auto_strategy(condition: &Predicate, left: &mut ExecutionNode, right: &mut ExecutionNode, catalog: &IndexCatalog) -> JoinStrategy {
    if is_merge_join_compatible(condition)
        && let Some(strategy) = try_adopt_merge_sort(condition, left, right, catalog)
    {
        return strategy;
    }
    if is_hash_join_compatible(condition) {
        return JoinStrategy::Hash;
    }
    if has_indexed_probe(condition, right) {
        return JoinStrategy::IndexedNestedLoop;
    }
    JoinStrategy::NestedLoop
}

/// Attempt to give both sides a leading sort on the join key,
/// atomically: either both sides already are (or can freely become,
/// per the catalog) sorted by their half of the key, or neither side is
/// mutated and merge join is not used — prepare both sides, commit both
/// or neither. A bare scan only "freely" adopts a
/// sort the catalog actually backs with a declared index extending its
/// pushed constraints — otherwise the backing store would have to sort
/// the whole result in memory, which is never free.
fn try_adopt_merge_sort(
    condition: &Predicate,
    left: &mut ExecutionNode,
    right: &mut ExecutionNode,
    catalog: &IndexCatalog,
) -> Option<JoinStrategy> {
    let Predicate::Comparison(cmp) = condition else {
        return None;
    };
    let left_field = cmp.left.as_field()?;
    let right_field = cmp.right.as_field()?;

    let left_ready = sort_ready(left, left_field, catalog);
    let right_ready = sort_ready(right, right_field, catalog);
    if !left_ready || !right_ready {
        return None;
    }

    adopt_sort(left, left_field);
    adopt_sort(right, right_field);
    Some(JoinStrategy::Merge)
}

fn sort_ready(node: &ExecutionNode, field: &crate::expr::Field, catalog: &IndexCatalog) -> bool {
    match node.planned_sort_key() {
        Some(existing) => existing == field,
        None => match node {
            ExecutionNode::Scan(scan) if scan.order_by.is_none() => {
                let sort = [crate::projection::OrderBySpec {
                    field: field.clone(),
                    direction: crate::projection::Direction::Asc,
                }];
                matches!(
                    catalog.match_index(&scan.collection, &scan.constraints, Some(&sort)),
                    crate::catalog::IndexMatch::Exact
                )
            }
            _ => false,
        },
    }
}

fn adopt_sort(node: &mut ExecutionNode, field: &crate::expr::Field) {
    if let ExecutionNode::Scan(scan) = node
        && scan.order_by.is_none()
    {
        scan.order_by = Some(vec![crate::projection::OrderBySpec {
            field: field.clone(),
            direction: crate::projection::Direction::Asc,
        }]);
    }
}

fn has_indexed_probe(condition: &Predicate, right: &ExecutionNode) -> bool {
    let ExecutionNode::Scan(scan) = right else {
        return false;
    };
    matches!(condition, Predicate::Comparison(cmp) if matches!(cmp.op, CompareOp::Eq) && !scan.constraints.is_empty())
        || involves_right_field(condition, right)
}

fn involves_right_field(condition: &Predicate, right: &ExecutionNode) -> bool {
    let ExecutionNode::Scan(scan) = right else {
        return false;
    };
    matches!(condition, Predicate::Comparison(cmp) if matches!(&cmp.right, Expression::Field(f) if f.alias == scan.alias))
}

const fn strategy_overhead(strategy: JoinStrategy) -> u32 {
    match strategy {
        JoinStrategy::Merge => 1,
        JoinStrategy::Hash => 2,
        JoinStrategy::IndexedNestedLoop => 3,
        JoinStrategy::NestedLoop => 50,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Field;
    use crate::projection::Collection;

    fn scan_plan(alias: &str, collection: &str, cost: u32) -> ScanPlan {
        ScanPlan {
            node: ExecutionNode::scan(Alias::from(alias), Collection::new(vec![collection.to_string()])),
            cost,
        }
    }

    #[test]
    fn orders_sources_by_ascending_cost() {
        let aliases = vec![Alias::from("a"), Alias::from("b")];
        let mut plans = BTreeMap::new();
        plans.insert(Alias::from("a"), scan_plan("a", "as", 500));
        plans.insert(Alias::from("b"), scan_plan("b", "bs", 1));

        let condition = Predicate::compare(
            CompareOp::Eq,
            Expression::Field(Field::parse("a.id").unwrap()),
            Expression::Field(Field::parse("b.a_id").unwrap()),
        );

        let (node, _cost) =
            build_join_tree(&aliases, plans, vec![condition], JoinHint::Auto, &IndexCatalog::default(), &PlannerConfig::default()).unwrap();

        match node {
            ExecutionNode::Join(join) => match *join.left {
                ExecutionNode::Scan(scan) => assert_eq!(scan.alias, Alias::from("b")),
                other => panic!("expected scan on the left, got {other:?}"),
            },
            other => panic!("expected a join node, got {other:?}"),
        }
    }

    #[test]
    fn no_connecting_predicate_is_a_cross_product() {
        let aliases = vec![Alias::from("a"), Alias::from("b")];
        let mut plans = BTreeMap::new();
        plans.insert(Alias::from("a"), scan_plan("a", "as", 1));
        plans.insert(Alias::from("b"), scan_plan("b", "bs", 1));

        let (node, _cost) =
            build_join_tree(&aliases, plans, vec![], JoinHint::Auto, &IndexCatalog::default(), &PlannerConfig::default()).unwrap();

        match node {
            ExecutionNode::Join(join) => {
                assert!(join.cross_product);
                assert_eq!(join.strategy, JoinStrategy::NestedLoop);
            }
            other => panic!("expected a join node, got {other:?}"),
        }
    }

    #[test]
    fn forced_merge_on_incompatible_condition_errors() {
        let aliases = vec![Alias::from("a"), Alias::from("b")];
        let mut plans = BTreeMap::new();
        plans.insert(Alias::from("a"), scan_plan("a", "as", 1));
        plans.insert(Alias::from("b"), scan_plan("b", "bs", 1));

        let condition = Predicate::compare(
            CompareOp::Lt,
            Expression::Field(Field::parse("a.id").unwrap()),
            Expression::Field(Field::parse("b.a_id").unwrap()),
        );

        let err =
            build_join_tree(&aliases, plans, vec![condition], JoinHint::Merge, &IndexCatalog::default(), &PlannerConfig::default()).unwrap_err();
        assert!(matches!(err, PlanningError::JoinHintIncompatible(JoinStrategyKind::Merge)));
    }
}
