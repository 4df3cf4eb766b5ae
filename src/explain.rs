//! Diagnostic view over an already-built execution tree. Purely
//! descriptive: walking an `ExecutionNode` into an `ExplainNode` as a
//! `{op, detail, children}` tree costs nothing during planning and
//! changes no planning decision.

use crate::plan::node::{ExecutionNode, JoinStrategy};

///
/// ExplainNode
///

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExplainNode {
    pub op: &'static str,
    pub detail: Vec<(&'static str, String)>,
    pub children: Vec<ExplainNode>,
}

impl ExecutionNode {
    #[must_use]
    pub fn explain(&self) -> ExplainNode {
        match self {
            Self::Scan(scan) => ExplainNode {
                op: "Scan",
                detail: vec![
                    ("alias", scan.alias.to_string()),
                    ("collection", scan.collection.path()),
                    ("constraints", scan.constraints.len().to_string()),
                    ("sorted", scan.order_by.is_some().to_string()),
                ],
                children: Vec::new(),
            },
            Self::Filter(filter) => ExplainNode {
                op: "Filter",
                detail: vec![("predicate", format!("{:?}", filter.predicate))],
                children: vec![filter.source.explain()],
            },
            Self::Join(join) => ExplainNode {
                op: "Join",
                detail: vec![
                    ("strategy", strategy_label(join.strategy).to_string()),
                    ("cross_product", join.cross_product.to_string()),
                ],
                children: vec![join.left.explain(), join.right.explain()],
            },
            Self::Union(union) => ExplainNode {
                op: "Union",
                detail: vec![("branches", union.inputs.len().to_string())],
                children: union.inputs.iter().map(ExecutionNode::explain).collect(),
            },
            Self::Sort(sort) => ExplainNode {
                op: "Sort",
                detail: vec![("keys", sort.order_by.len().to_string())],
                children: vec![sort.source.explain()],
            },
            Self::Limit(limit) => ExplainNode {
                op: "Limit",
                detail: vec![
                    ("limit", limit.limit.map_or_else(|| "-".to_string(), |v| v.to_string())),
                    ("offset", limit.offset.map_or_else(|| "-".to_string(), |v| v.to_string())),
                ],
                children: vec![limit.source.explain()],
            },
            Self::Project(project) => ExplainNode {
                op: "Project",
                detail: vec![("fields", project.fields.len().to_string())],
                children: vec![project.source.explain()],
            },
        }
    }
}

const fn strategy_label(strategy: JoinStrategy) -> &'static str {
    match strategy {
        JoinStrategy::Hash => "hash",
        JoinStrategy::Merge => "merge",
        JoinStrategy::IndexedNestedLoop => "indexed_nested_loop",
        JoinStrategy::NestedLoop => "nested_loop",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Alias;
    use crate::projection::Collection;

    #[test]
    fn explain_mirrors_tree_shape() {
        let scan = ExecutionNode::scan(Alias::from("u"), Collection::new(vec!["users".into()]));
        let limited = scan.limit(Some(10), None);
        let explained = limited.explain();
        assert_eq!(explained.op, "Limit");
        assert_eq!(explained.children.len(), 1);
        assert_eq!(explained.children[0].op, "Scan");
    }
}
