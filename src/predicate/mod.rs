//! Predicate model and utilities.
//!
//! A pure, schema-agnostic AST (`ast`), a deterministic `normalize`
//! pass, plus the planner-facing utilities disjunction handling and
//! joins need: DNF conversion (`dnf`), structural equality keys
//! (`canonical`), and join/operator helpers (`ops`) — all pure
//! functions, no I/O.

pub mod ast;
pub mod canonical;
pub mod dnf;
pub mod normalize;
pub mod ops;
#[cfg(test)]
mod tests;

pub use ast::{CompareOp, ComparePredicate, Predicate};
pub use canonical::canonical_key;
pub use dnf::to_dnf;
pub use normalize::simplify;
pub use ops::{invert_comparison, is_hash_join_compatible, is_merge_join_compatible};
