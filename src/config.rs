//! Configurable planner cost constants.
//!
//! The OR-rewrite cost penalties are fields on `PlannerConfig` rather
//! than hardwired literals, so a deployment can retune them without a
//! code change; defaults match the values this module was designed
//! against.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannerConfig {
    /// Cost assigned to a scan whose constraints match no declared
    /// index.
    pub index_none_cost: u32,

    /// Cost added per non-indexable conjunct folded into a scan's
    /// residual filter.
    pub non_indexable_penalty: u32,

    /// Per-extra-disjunct penalty added to a union plan's cost when the
    /// disjuncts carry join predicates.
    pub or_union_join_penalty: u32,

    /// Per-extra-disjunct penalty added to a union plan's cost when the
    /// disjuncts are join-free.
    pub or_union_scan_penalty: u32,

    /// Per-disjunct penalty added to the common-factor plan's cost.
    pub or_common_factor_penalty: u32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            index_none_cost: 1000,
            non_indexable_penalty: 100,
            or_union_join_penalty: 500,
            or_union_scan_penalty: 50,
            or_common_factor_penalty: 10,
        }
    }
}
