//! Declared composite index catalog.
//!
//! Indexes here are externally declared descriptors, not derived from a
//! typed entity model: a collection group, a scope, and an ordered list
//! of fields. Matching walks a constraint set against an index's fields
//! prefix-of-equalities, then at most one range field, then an optional
//! sort field, reporting exact/partial/none coverage.

use crate::expr::FieldPath;
use crate::plan::constraint::Constraint;
use crate::predicate::ast::CompareOp;
use crate::projection::{Collection, Direction, OrderBySpec};
use std::collections::HashSet;

///
/// IndexScope
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexScope {
    Collection,
    CollectionGroup,
}

///
/// IndexFieldSpec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexFieldSpec {
    pub path: FieldPath,
    pub direction: Direction,
}

impl IndexFieldSpec {
    #[must_use]
    pub fn new(path: Vec<String>, direction: Direction) -> Self {
        Self {
            path: FieldPath::new(path),
            direction,
        }
    }
}

///
/// IndexDef
///
/// One declared composite index: the collection group it applies to,
/// its scope, and its ordered field list.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexDef {
    pub collection_group: String,
    pub scope: IndexScope,
    pub fields: Vec<IndexFieldSpec>,
}

///
/// IndexMatch
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexMatch {
    Exact,
    Partial(usize),
    None,
}

impl IndexMatch {
    #[must_use]
    pub const fn covered_prefix_len(self) -> usize {
        match self {
            Self::Exact => usize::MAX,
            Self::Partial(len) => len,
            Self::None => 0,
        }
    }

    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

///
/// IndexCatalog
///
/// Read-only once constructed: `match_index` is the only operation the
/// planner calls during planning.
///

#[derive(Clone, Debug, Default)]
pub struct IndexCatalog {
    indexes: Vec<IndexDef>,
}

impl IndexCatalog {
    #[must_use]
    pub fn new(indexes: Vec<IndexDef>) -> Self {
        Self { indexes }
    }

    /// Indexes declared against `collection`'s group, in stable
    /// declaration order (ties in `match` are broken by catalog order so
    /// results are deterministic across calls).
    fn candidates<'a>(&'a self, collection: &'a Collection) -> impl Iterator<Item = &'a IndexDef> {
        self.indexes.iter().filter(move |index| {
            index.collection_group == collection.group_name()
                && match index.scope {
                    IndexScope::Collection => !collection.collection_group,
                    IndexScope::CollectionGroup => collection.collection_group,
                }
        })
    }

    /// An index *covers* a constraint set when its prefix of fields
    /// contains every equality/membership constraint (order-insensitive
    /// within that prefix), followed by at most one range field,
    /// followed by the sort field if present, with compatible
    /// direction. `Exact` when everything is covered; `Partial(k)` when
    /// the first `k` fields are usable; otherwise `None`.
    #[must_use]
    pub fn match_index(
        &self,
        collection: &Collection,
        constraints: &[Constraint],
        sort: Option<&[OrderBySpec]>,
    ) -> IndexMatch {
        let mut best = IndexMatch::None;

        for index in self.candidates(collection) {
            let candidate = match_single(index, constraints, sort);
            best = better(best, candidate);
            if matches!(best, IndexMatch::Exact) {
                break;
            }
        }

        best
    }
}

fn better(current: IndexMatch, candidate: IndexMatch) -> IndexMatch {
    if candidate.covered_prefix_len() > current.covered_prefix_len() {
        candidate
    } else {
        current
    }
}

fn match_single(
    index: &IndexDef,
    constraints: &[Constraint],
    sort: Option<&[OrderBySpec]>,
) -> IndexMatch {
    let mut remaining_eq: HashSet<&FieldPath> = constraints
        .iter()
        .filter(|c| !c.op.is_inequality())
        .map(|c| &c.field.path)
        .collect();
    let range_field = constraints.iter().find(|c| c.op.is_inequality()).map(|c| &c.field.path);

    let mut position = 0;
    let mut consumed = 0;

    while position < index.fields.len() {
        let field = &index.fields[position];
        if remaining_eq.remove(&field.path) {
            consumed += 1;
            position += 1;
        } else {
            break;
        }
    }

    let mut range_covered = range_field.is_none();
    if let Some(range_path) = range_field
        && position < index.fields.len()
        && &index.fields[position].path == range_path
    {
        range_covered = true;
        consumed += 1;
        position += 1;
    }

    let mut sort_covered = sort.is_none_or(<[OrderBySpec]>::is_empty);
    if let Some(order) = sort
        && let Some(leading) = order.first()
        && position < index.fields.len()
        && index.fields[position].path == leading.field.path
        && index.fields[position].direction == leading.direction
    {
        sort_covered = true;
        consumed += 1;
    }

    if remaining_eq.is_empty() && range_covered && sort_covered {
        IndexMatch::Exact
    } else if consumed > 0 {
        IndexMatch::Partial(consumed)
    } else {
        IndexMatch::None
    }
}

/// Only `Eq`, the set-membership ops, and the inequality ops are
/// meaningful for index-prefix matching; other comparisons never
/// qualify as push-down constraints in the first place.
#[must_use]
pub const fn is_indexable_op(op: CompareOp) -> bool {
    !matches!(op, CompareOp::ArrayContains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Field;
    use crate::plan::constraint::ConstraintValue;
    use crate::value::Literal;

    fn idx(fields: &[(&str, Direction)]) -> IndexDef {
        IndexDef {
            collection_group: "users".to_string(),
            scope: IndexScope::Collection,
            fields: fields
                .iter()
                .map(|(name, dir)| IndexFieldSpec::new(vec![(*name).to_string()], *dir))
                .collect(),
        }
    }

    fn eq_constraint(field: &str, value: &str) -> Constraint {
        Constraint {
            field: Field::parse(field).unwrap(),
            op: CompareOp::Eq,
            value: ConstraintValue::Literal(Literal::String(value.to_string())),
        }
    }

    #[test]
    fn exact_match_on_equality_prefix() {
        let catalog = IndexCatalog::new(vec![idx(&[("country", Direction::Asc)])]);
        let collection = Collection::new(vec!["users".into()]);
        let constraints = vec![eq_constraint("u.country", "FR")];
        assert_eq!(
            catalog.match_index(&collection, &constraints, None),
            IndexMatch::Exact
        );
    }

    #[test]
    fn partial_match_when_sort_field_missing() {
        let catalog = IndexCatalog::new(vec![idx(&[("country", Direction::Asc)])]);
        let collection = Collection::new(vec!["users".into()]);
        let constraints = vec![eq_constraint("u.country", "FR")];
        let sort = vec![OrderBySpec {
            field: Field::parse("u.age").unwrap(),
            direction: Direction::Asc,
        }];
        assert_eq!(
            catalog.match_index(&collection, &constraints, Some(&sort)),
            IndexMatch::Partial(1)
        );
    }

    #[test]
    fn none_when_no_index_declared() {
        let catalog = IndexCatalog::new(vec![]);
        let collection = Collection::new(vec!["users".into()]);
        let constraints = vec![eq_constraint("u.country", "FR")];
        assert_eq!(catalog.match_index(&collection, &constraints, None), IndexMatch::None);
    }
}
