//! Top-level planning entrypoint.
//!
//! Validate, normalize, delegate to the per-concern passes, wrap in the
//! caller-facing output type.

use crate::catalog::IndexCatalog;
use crate::config::PlannerConfig;
use crate::error::PlanningError;
use crate::expr::{Alias, Expression, Field};
use crate::plan::node::ExecutionNode;
use crate::plan::{join, or_handler, scan};
use crate::predicate::ast::{ComparePredicate, Predicate};
use crate::predicate::normalize::simplify;
use crate::projection::{Collection, Direction, OrderBySpec, ParamValue, Projection};
use crate::split;
use std::collections::{BTreeMap, HashMap};

///
/// Planner
///
/// Holds a read-only `IndexCatalog` and the cost constants used to
/// weigh candidate plans. Planning is pure: `plan` takes `&self` and
/// performs no mutation observable across calls.
///

#[derive(Clone, Debug)]
pub struct Planner {
    catalog: IndexCatalog,
    config: PlannerConfig,
}

impl Planner {
    #[must_use]
    pub fn new(catalog: IndexCatalog) -> Self {
        Self {
            catalog,
            config: PlannerConfig::default(),
        }
    }

    #[must_use]
    pub const fn with_config(catalog: IndexCatalog, config: PlannerConfig) -> Self {
        Self { catalog, config }
    }

    /// Compile `projection` into an `ExecutionNode`, resolving any
    /// `Param` references against `params` first.
    pub fn plan(
        &self,
        projection: &Projection,
        params: Option<&HashMap<String, ParamValue>>,
    ) -> Result<ExecutionNode, PlanningError> {
        let aliases: Vec<Alias> = projection.from.keys().cloned().collect();
        if aliases.is_empty() {
            return Err(PlanningError::NoSources);
        }

        validate_aliases(
            projection.where_predicate.as_ref(),
            &projection.order_by,
            projection.select.as_ref(),
            &aliases,
        )?;

        let resolved = match &projection.where_predicate {
            Some(predicate) => resolve_params(predicate, params)?,
            None => Predicate::Constant(true),
        };
        let simplified = simplify(&resolved);

        let (mut node, _cost) = or_handler::plan_or(
            &projection.from,
            &simplified,
            &projection.order_by,
            &self.catalog,
            &self.config,
            &projection.hints,
        )?;

        node = apply_sort_limit(node, &projection.order_by, projection.limit, projection.offset);
        node = apply_projection(node, projection.select.as_ref());

        Ok(node)
    }
}

/// Plan a single non-disjunctive predicate across every source: split
/// into source-local/join/residual buckets, plan each scan, build the
/// join tree, and fold any leftover residual into a final filter.
/// Shared by `Planner::plan` and, per disjunct, by `or_handler`.
pub(crate) fn build_base_plan(
    collections: &BTreeMap<Alias, Collection>,
    predicate: &Predicate,
    order_by: &[OrderBySpec],
    catalog: &IndexCatalog,
    config: &PlannerConfig,
    join_hint: crate::projection::JoinHint,
) -> Result<(ExecutionNode, u32), PlanningError> {
    let aliases: Vec<Alias> = collections.keys().cloned().collect();
    let split_result = split::split(predicate, &aliases);

    let mut scan_plans = BTreeMap::new();
    for (alias, collection) in collections {
        let source_predicate = split_result.source_predicates.get(alias);
        let alias_order_by: Vec<OrderBySpec> =
            order_by.iter().filter(|spec| &spec.field.alias == alias).cloned().collect();
        let plan = scan::plan_scan(alias, collection, source_predicate, &alias_order_by, catalog, config)?;
        scan_plans.insert(alias.clone(), plan);
    }

    let (mut node, mut cost) =
        join::build_join_tree(&aliases, scan_plans, split_result.join_predicates, join_hint, catalog, config)?;

    if !split_result.residual_predicates.is_empty() {
        node = node.filter(combine_and(split_result.residual_predicates));
        cost = cost.saturating_add(config.non_indexable_penalty);
    }

    Ok((node, cost))
}

fn combine_and(predicates: Vec<Predicate>) -> Predicate {
    match predicates.len() {
        0 => Predicate::Constant(true),
        1 => predicates.into_iter().next().unwrap_or(Predicate::Constant(true)),
        _ => Predicate::And(predicates),
    }
}

fn apply_sort_limit(node: ExecutionNode, order_by: &[OrderBySpec], limit: Option<u32>, offset: Option<u32>) -> ExecutionNode {
    let mut node = node;
    if !order_by.is_empty() && !sort_already_satisfied(&node, order_by) {
        node = node.sort(order_by.to_vec());
    }
    if limit.is_some() || offset.is_some() {
        node = node.limit(limit, offset);
    }
    node
}

fn sort_already_satisfied(node: &ExecutionNode, order_by: &[OrderBySpec]) -> bool {
    order_by.len() == 1
        && order_by[0].direction == Direction::Asc
        && node.planned_sort_key() == Some(&order_by[0].field)
}

fn apply_projection(node: ExecutionNode, select: Option<&BTreeMap<Alias, Expression>>) -> ExecutionNode {
    match select {
        Some(fields) => node.project(fields.clone()),
        None => node,
    }
}

fn resolve_params(predicate: &Predicate, params: Option<&HashMap<String, ParamValue>>) -> Result<Predicate, PlanningError> {
    match predicate {
        Predicate::Constant(value) => Ok(Predicate::Constant(*value)),
        Predicate::Comparison(cmp) => Ok(Predicate::Comparison(ComparePredicate {
            op: cmp.op,
            left: resolve_expr(&cmp.left, params)?,
            right: resolve_expr(&cmp.right, params)?,
        })),
        Predicate::And(children) => Ok(Predicate::And(
            children.iter().map(|c| resolve_params(c, params)).collect::<Result<_, _>>()?,
        )),
        Predicate::Or(children) => Ok(Predicate::Or(
            children.iter().map(|c| resolve_params(c, params)).collect::<Result<_, _>>()?,
        )),
        Predicate::Not(inner) => Ok(Predicate::Not(Box::new(resolve_params(inner, params)?))),
    }
}

fn resolve_expr(expr: &Expression, params: Option<&HashMap<String, ParamValue>>) -> Result<Expression, PlanningError> {
    match expr {
        Expression::Param(name) => {
            let value = params
                .and_then(|p| p.get(name))
                .cloned()
                .ok_or_else(|| PlanningError::ParameterMissing(name.clone()))?;
            Ok(Expression::Literal(value.into()))
        }
        Expression::List(items) => Ok(Expression::List(
            items.iter().map(|item| resolve_expr(item, params)).collect::<Result<_, _>>()?,
        )),
        Expression::Field(_) | Expression::Literal(_) => Ok(expr.clone()),
    }
}

fn validate_aliases(
    predicate: Option<&Predicate>,
    order_by: &[OrderBySpec],
    select: Option<&BTreeMap<Alias, Expression>>,
    aliases: &[Alias],
) -> Result<(), PlanningError> {
    if let Some(predicate) = predicate {
        validate_predicate_aliases(predicate, aliases)?;
    }
    for spec in order_by {
        validate_field_alias(&spec.field, aliases)?;
    }
    if let Some(fields) = select {
        for expr in fields.values() {
            validate_expr_aliases(expr, aliases)?;
        }
    }
    Ok(())
}

fn validate_predicate_aliases(predicate: &Predicate, aliases: &[Alias]) -> Result<(), PlanningError> {
    match predicate {
        Predicate::Constant(_) => Ok(()),
        Predicate::Comparison(cmp) => {
            validate_expr_aliases(&cmp.left, aliases)?;
            validate_expr_aliases(&cmp.right, aliases)
        }
        Predicate::Not(inner) => validate_predicate_aliases(inner, aliases),
        Predicate::And(children) | Predicate::Or(children) => {
            children.iter().try_for_each(|child| validate_predicate_aliases(child, aliases))
        }
    }
}

fn validate_expr_aliases(expr: &Expression, aliases: &[Alias]) -> Result<(), PlanningError> {
    match expr {
        Expression::Field(field) => validate_field_alias(field, aliases),
        Expression::List(items) => items.iter().try_for_each(|item| validate_expr_aliases(item, aliases)),
        Expression::Literal(_) | Expression::Param(_) => Ok(()),
    }
}

fn validate_field_alias(field: &Field, aliases: &[Alias]) -> Result<(), PlanningError> {
    if aliases.contains(&field.alias) {
        Ok(())
    } else {
        Err(PlanningError::UnknownAlias(field.alias.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{IndexCatalog, IndexDef, IndexFieldSpec, IndexScope};
    use crate::predicate::ast::CompareOp;
    use crate::value::Literal;

    fn users_projection() -> Projection {
        let mut from = BTreeMap::new();
        from.insert(Alias::from("u"), Collection::new(vec!["users".into()]));
        let mut projection = Projection::new(from);
        projection.where_predicate = Some(Predicate::compare(
            CompareOp::Eq,
            Expression::Field(Field::parse("u.country").unwrap()),
            Expression::Literal(Literal::String("FR".into())),
        ));
        projection
    }

    #[test]
    fn rejects_empty_projection() {
        let planner = Planner::new(IndexCatalog::default());
        let projection = Projection::new(BTreeMap::new());
        assert_eq!(planner.plan(&projection, None).unwrap_err(), PlanningError::NoSources);
    }

    #[test]
    fn rejects_unknown_alias_in_predicate() {
        let planner = Planner::new(IndexCatalog::default());
        let mut from = BTreeMap::new();
        from.insert(Alias::from("u"), Collection::new(vec!["users".into()]));
        let mut projection = Projection::new(from);
        projection.where_predicate = Some(Predicate::compare(
            CompareOp::Eq,
            Expression::Field(Field::parse("x.country").unwrap()),
            Expression::Literal(Literal::String("FR".into())),
        ));

        assert_eq!(
            planner.plan(&projection, None).unwrap_err(),
            PlanningError::UnknownAlias("x".to_string())
        );
    }

    #[test]
    fn plans_single_source_equality_scan() {
        let catalog = IndexCatalog::new(vec![IndexDef {
            collection_group: "users".into(),
            scope: IndexScope::Collection,
            fields: vec![IndexFieldSpec::new(vec!["country".into()], Direction::Asc)],
        }]);
        let planner = Planner::new(catalog);
        let node = planner.plan(&users_projection(), None).unwrap();
        match node {
            ExecutionNode::Scan(scan) => assert_eq!(scan.constraints.len(), 1),
            other => panic!("expected a bare scan, got {other:?}"),
        }
    }
}
