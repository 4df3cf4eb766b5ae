//! Physical planning: constraints, the execution tree, and the passes
//! that build one from a normalized projection.

pub mod constraint;
pub mod join;
pub mod node;
pub mod or_handler;
pub mod orchestrate;
pub mod scan;
#[cfg(test)]
mod tests;

pub use constraint::{Constraint, ConstraintValue};
pub use node::{DistinctStrategy, ExecutionNode, JoinStrategy};
pub use orchestrate::Planner;
