//! Single-source scan planner.
//!
//! Pushes down whatever equality/range/set-membership comparisons a
//! source-local predicate carries, enforces the backend's guardrails on
//! what it can push down, and scores the result against the declared
//! `IndexCatalog`.

use crate::catalog::{IndexCatalog, IndexMatch};
use crate::config::PlannerConfig;
use crate::error::PlanningError;
use crate::expr::{Alias, Expression, Field};
use crate::plan::constraint::{Constraint, ConstraintValue};
use crate::plan::node::ExecutionNode;
use crate::predicate::ast::{CompareOp, Predicate};
use crate::predicate::normalize::simplify;
use crate::projection::{Collection, OrderBySpec};
use crate::value::Literal;

///
/// ScanPlan
///
/// A planned single-source scan together with its push-down cost, used
/// by the join planner to order sources before building the join tree.
///

#[derive(Clone, Debug)]
pub struct ScanPlan {
    pub node: ExecutionNode,
    pub cost: u32,
}

/// Plan a scan of `alias`'s `collection`, pushing down whatever prefix
/// of `predicate` the catalog can satisfy and folding the remainder
/// into a `Filter` wrapping the scan.
pub fn plan_scan(
    alias: &Alias,
    collection: &Collection,
    predicate: Option<&Predicate>,
    order_by: &[OrderBySpec],
    catalog: &IndexCatalog,
    config: &PlannerConfig,
) -> Result<ScanPlan, PlanningError> {
    let conjuncts = predicate.map(|p| flatten_and(&simplify(p))).unwrap_or_default();
    let full_conjuncts = conjuncts.clone();

    let mut pushed: Vec<Constraint> = Vec::new();
    let mut residual: Vec<Predicate> = Vec::new();

    for conjunct in conjuncts {
        match as_constraint(&conjunct) {
            Some(constraint) => pushed.push(constraint),
            None => residual.push(conjunct),
        }
    }

    demote_extra_set_membership(&mut pushed, &mut residual);
    enforce_inequality_guardrail(&pushed)?;
    enforce_order_by_guardrail(&pushed, order_by)?;

    let non_indexable = residual.len();
    let sort_covered = catalog_covers_sort(catalog, collection, &pushed, order_by);
    let index_match = catalog.match_index(collection, &pushed, (!order_by.is_empty()).then_some(order_by));
    let no_pushdown = pushed.is_empty();

    let mut node = ExecutionNode::scan(alias.clone(), collection.clone());
    if let ExecutionNode::Scan(scan) = &mut node {
        scan.constraints = pushed;
        if sort_covered && !order_by.is_empty() {
            scan.order_by = Some(order_by.to_vec());
        }
    }

    if !residual.is_empty() {
        let combined = match full_conjuncts.len() {
            1 => full_conjuncts.into_iter().next().unwrap_or(Predicate::Constant(true)),
            _ => Predicate::And(full_conjuncts),
        };
        node = node.filter(combined);
    }

    let cost = if no_pushdown {
        u32::MAX
    } else {
        score(index_match, config) + u32::try_from(non_indexable).unwrap_or(u32::MAX) * config.non_indexable_penalty
    };

    Ok(ScanPlan { node, cost })
}

fn score(index_match: IndexMatch, config: &PlannerConfig) -> u32 {
    match index_match {
        IndexMatch::Exact => 1,
        IndexMatch::Partial(k) => {
            let k = u32::try_from(k).unwrap_or(u32::MAX);
            10u32.saturating_sub(k).max(1) + 5
        }
        IndexMatch::None => config.index_none_cost,
    }
}

fn catalog_covers_sort(
    catalog: &IndexCatalog,
    collection: &Collection,
    constraints: &[Constraint],
    order_by: &[OrderBySpec],
) -> bool {
    if order_by.is_empty() {
        return true;
    }
    matches!(
        catalog.match_index(collection, constraints, Some(order_by)),
        IndexMatch::Exact
    )
}

fn flatten_and(predicate: &Predicate) -> Vec<Predicate> {
    match predicate {
        Predicate::And(children) => children.iter().flat_map(flatten_and).collect(),
        Predicate::Constant(true) => Vec::new(),
        other => vec![other.clone()],
    }
}

/// A source-local comparison is push-down eligible when it compares a
/// field to a literal or a literal list, in either operand order.
fn as_constraint(predicate: &Predicate) -> Option<Constraint> {
    let Predicate::Comparison(cmp) = predicate else {
        return None;
    };

    if let (Some(field), Some(value)) = (cmp.left.as_field(), literal_value(&cmp.right)) {
        return Some(Constraint {
            field: field.clone(),
            op: cmp.op,
            value,
        });
    }

    if let (Some(value), Some(field)) = (literal_value(&cmp.left), cmp.right.as_field()) {
        let op = crate::predicate::ops::invert_comparison(cmp.op)?;
        return Some(Constraint {
            field: field.clone(),
            op,
            value,
        });
    }

    None
}

fn literal_value(expr: &Expression) -> Option<ConstraintValue> {
    match expr {
        Expression::Literal(value) => Some(ConstraintValue::Literal(value.clone())),
        Expression::List(items) => items
            .iter()
            .map(Expression::as_literal)
            .collect::<Option<Vec<&Literal>>>()
            .map(|values| ConstraintValue::List(values.into_iter().cloned().collect())),
        Expression::Field(_) | Expression::Param(_) => None,
    }
}

fn enforce_inequality_guardrail(pushed: &[Constraint]) -> Result<(), PlanningError> {
    let mut fields: Vec<Field> = pushed
        .iter()
        .filter(|c| c.op.is_inequality())
        .map(|c| c.field.clone())
        .collect();
    fields.dedup();

    let mut distinct: Vec<String> = fields.iter().map(|f| format!("{}.{}", f.alias, f.path.dotted())).collect();
    distinct.sort();
    distinct.dedup();

    if distinct.len() > 1 {
        return Err(PlanningError::multiple_inequality_fields(distinct));
    }
    Ok(())
}

/// At most one set-membership op may be pushed per scan, priority
/// `In` > `ArrayContainsAny` > `NotIn`. Demoted constraints fall back to
/// the scan's residual filter.
fn demote_extra_set_membership(pushed: &mut Vec<Constraint>, residual: &mut Vec<Predicate>) {
    let mut candidates: Vec<usize> = pushed
        .iter()
        .enumerate()
        .filter(|(_, c)| c.op.is_set_membership())
        .map(|(index, _)| index)
        .collect();

    if candidates.len() <= 1 {
        return;
    }

    candidates.sort_by_key(|&index| priority(pushed[index].op));
    let keep = candidates[0];

    let demote: Vec<usize> = candidates.into_iter().skip(1).collect();
    let mut demote_sorted = demote;
    demote_sorted.sort_unstable_by(|a, b| b.cmp(a));

    for index in demote_sorted {
        if index == keep {
            continue;
        }
        let constraint = pushed.remove(index);
        residual.push(constraint_to_predicate(&constraint));
    }
}

const fn priority(op: CompareOp) -> u8 {
    match op {
        CompareOp::In => 0,
        CompareOp::ArrayContainsAny => 1,
        CompareOp::NotIn => 2,
        _ => 255,
    }
}

fn constraint_to_predicate(constraint: &Constraint) -> Predicate {
    let right = match &constraint.value {
        ConstraintValue::Literal(value) => Expression::Literal(value.clone()),
        ConstraintValue::List(values) => Expression::List(values.iter().cloned().map(Expression::Literal).collect()),
    };
    Predicate::compare(constraint.op, Expression::Field(constraint.field.clone()), right)
}

fn enforce_order_by_guardrail(pushed: &[Constraint], order_by: &[OrderBySpec]) -> Result<(), PlanningError> {
    let Some(inequality) = pushed.iter().find(|c| c.op.is_inequality()) else {
        return Ok(());
    };
    let Some(leading) = order_by.first() else {
        return Ok(());
    };

    if leading.field != inequality.field {
        return Err(PlanningError::OrderByMustMatchInequalityField);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{IndexCatalog, IndexDef, IndexFieldSpec, IndexScope};
    use crate::projection::Direction;

    fn users() -> Collection {
        Collection::new(vec!["users".into()])
    }

    fn cmp(field: &str, op: CompareOp, value: Literal) -> Predicate {
        Predicate::compare(op, Expression::Field(Field::parse(field).unwrap()), Expression::Literal(value))
    }

    #[test]
    fn pushes_single_equality_as_exact_match() {
        let catalog = IndexCatalog::new(vec![IndexDef {
            collection_group: "users".into(),
            scope: IndexScope::Collection,
            fields: vec![IndexFieldSpec::new(vec!["country".into()], Direction::Asc)],
        }]);
        let config = PlannerConfig::default();
        let predicate = cmp("u.country", CompareOp::Eq, Literal::String("FR".into()));

        let plan = plan_scan(&Alias::from("u"), &users(), Some(&predicate), &[], &catalog, &config).unwrap();
        assert_eq!(plan.cost, 1);
        match plan.node {
            ExecutionNode::Scan(scan) => assert_eq!(scan.constraints.len(), 1),
            other => panic!("expected bare scan, got {other:?}"),
        }
    }

    #[test]
    fn rejects_two_inequality_fields() {
        let catalog = IndexCatalog::default();
        let config = PlannerConfig::default();
        let predicate = Predicate::And(vec![
            cmp("u.age", CompareOp::Gt, Literal::Number(18.0)),
            cmp("u.score", CompareOp::Lt, Literal::Number(100.0)),
        ]);

        let err = plan_scan(&Alias::from("u"), &users(), Some(&predicate), &[], &catalog, &config).unwrap_err();
        assert!(matches!(err, PlanningError::MultipleInequalityFields(_)));
    }

    #[test]
    fn order_by_must_match_inequality_field() {
        let catalog = IndexCatalog::default();
        let config = PlannerConfig::default();
        let predicate = cmp("u.age", CompareOp::Gt, Literal::Number(18.0));
        let order_by = vec![OrderBySpec {
            field: Field::parse("u.name").unwrap(),
            direction: Direction::Asc,
        }];

        let err =
            plan_scan(&Alias::from("u"), &users(), Some(&predicate), &order_by, &catalog, &config).unwrap_err();
        assert_eq!(err, PlanningError::OrderByMustMatchInequalityField);
    }

    #[test]
    fn no_declared_index_costs_configured_penalty() {
        let catalog = IndexCatalog::default();
        let config = PlannerConfig::default();
        let predicate = cmp("u.country", CompareOp::Eq, Literal::String("FR".into()));

        let plan = plan_scan(&Alias::from("u"), &users(), Some(&predicate), &[], &catalog, &config).unwrap();
        assert_eq!(plan.cost, config.index_none_cost);
    }
}
