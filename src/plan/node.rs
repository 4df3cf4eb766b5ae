//! Execution tree output type.
//!
//! The full multi-source operator tree (Scan/Filter/Join/Union/Sort/
//! Limit/Project) the executor (out of scope here) will walk.

use crate::expr::{Alias, Expression, Field};
use crate::plan::constraint::Constraint;
use crate::predicate::ast::Predicate;
use crate::projection::{Collection, OrderBySpec};
use std::collections::BTreeMap;

///
/// JoinStrategy
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinStrategy {
    Hash,
    Merge,
    IndexedNestedLoop,
    NestedLoop,
}

///
/// DistinctStrategy
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DistinctStrategy {
    DocPath,
}

///
/// ExecutionNode
///

#[derive(Clone, Debug, PartialEq)]
pub enum ExecutionNode {
    Scan(ScanNode),
    Filter(FilterNode),
    Join(JoinNode),
    Union(UnionNode),
    Sort(SortNode),
    Limit(LimitNode),
    Project(ProjectNode),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScanNode {
    pub alias: Alias,
    pub collection: Collection,
    pub constraints: Vec<Constraint>,
    pub order_by: Option<Vec<OrderBySpec>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FilterNode {
    pub source: Box<ExecutionNode>,
    pub predicate: Predicate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinNode {
    pub left: Box<ExecutionNode>,
    pub right: Box<ExecutionNode>,
    pub strategy: JoinStrategy,
    pub condition: Predicate,
    pub cross_product: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnionNode {
    pub inputs: Vec<ExecutionNode>,
    pub distinct_strategy: DistinctStrategy,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SortNode {
    pub source: Box<ExecutionNode>,
    pub order_by: Vec<OrderBySpec>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LimitNode {
    pub source: Box<ExecutionNode>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProjectNode {
    pub source: Box<ExecutionNode>,
    pub fields: BTreeMap<Alias, Expression>,
}

impl ExecutionNode {
    #[must_use]
    pub fn scan(alias: Alias, collection: Collection) -> Self {
        Self::Scan(ScanNode {
            alias,
            collection,
            constraints: Vec::new(),
            order_by: None,
        })
    }

    #[must_use]
    pub fn filter(self, predicate: Predicate) -> Self {
        Self::Filter(FilterNode {
            source: Box::new(self),
            predicate,
        })
    }

    #[must_use]
    pub fn join(self, right: Self, strategy: JoinStrategy, condition: Predicate) -> Self {
        let cross_product = condition.is_constant_true();
        Self::Join(JoinNode {
            left: Box::new(self),
            right: Box::new(right),
            strategy,
            condition,
            cross_product,
        })
    }

    #[must_use]
    pub fn sort(self, order_by: Vec<OrderBySpec>) -> Self {
        Self::Sort(SortNode {
            source: Box::new(self),
            order_by,
        })
    }

    #[must_use]
    pub fn limit(self, limit: Option<u32>, offset: Option<u32>) -> Self {
        Self::Limit(LimitNode {
            source: Box::new(self),
            limit,
            offset,
        })
    }

    #[must_use]
    pub fn project(self, fields: BTreeMap<Alias, Expression>) -> Self {
        Self::Project(ProjectNode {
            source: Box::new(self),
            fields,
        })
    }

    /// The leading order-by field this subtree is already sorted by,
    /// ascending, without inserting a `Sort` node.
    #[must_use]
    pub fn planned_sort_key(&self) -> Option<&Field> {
        match self {
            Self::Scan(scan) => scan.order_by.as_ref().and_then(|order| order.first()).and_then(
                |spec| matches!(spec.direction, crate::projection::Direction::Asc).then_some(&spec.field),
            ),
            Self::Filter(node) => node.source.planned_sort_key(),
            Self::Project(node) => node.source.planned_sort_key(),
            Self::Limit(node) => node.source.planned_sort_key(),
            Self::Sort(node) => node
                .order_by
                .first()
                .and_then(|spec| matches!(spec.direction, crate::projection::Direction::Asc).then_some(&spec.field)),
            Self::Join(node) => match node.strategy {
                JoinStrategy::Merge => merge_left_key(&node.condition, &node.left),
                JoinStrategy::Hash | JoinStrategy::IndexedNestedLoop | JoinStrategy::NestedLoop => {
                    node.left.planned_sort_key()
                }
            },
            Self::Union(_) => None,
        }
    }
}

fn merge_left_key<'a>(condition: &'a Predicate, left: &'a ExecutionNode) -> Option<&'a Field> {
    if let Predicate::Comparison(cmp) = condition
        && let Some(field) = cmp.left.as_field()
    {
        return Some(field);
    }
    left.planned_sort_key()
}
