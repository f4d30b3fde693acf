//! Per-edge propagation rules.
//!
//! These are pure functions of an edge's annotations and condition sets; the
//! walks in [`engine`](super::engine) and [`query`](super::query) apply them.

use crate::graph::{EdgeAnnotations, TargetNode};
use crate::license::condition::{ConditionSet, LicenseCondition, IMPLIES_RESTRICTED};

/// Conditions that only ever describe what the distributing target must do.
const TARGET_ONLY: ConditionSet = ConditionSet::from_bits(
    LicenseCondition::Unencumbered as u16
        | LicenseCondition::Permissive as u16
        | LicenseCondition::Notice as u16
        | LicenseCondition::Reciprocal as u16
        | LicenseCondition::Proprietary as u16
        | LicenseCondition::ByExceptionOnly as u16,
);

/// Conditions flowing up from `dependency` to the target across one edge.
///
/// Derivation passes the restricted family; dynamic linking passes only strict
/// restricted, and not even that when the dependency is licensed under a
/// classpath exception; toolchain passes nothing.
pub fn dep_conditions_propagating_to_target(
    annotations: &EdgeAnnotations,
    dependency: &TargetNode,
    dep_conditions: ConditionSet,
) -> ConditionSet {
    if annotations.is_toolchain() {
        return ConditionSet::empty();
    }
    if annotations.is_derivation() {
        return dep_conditions.intersection(IMPLIES_RESTRICTED);
    }
    if dependency.is_classpath_exception_only() {
        return ConditionSet::empty();
    }
    dep_conditions.intersection(LicenseCondition::Restricted.into())
}

/// Conditions flowing down from `target` to a dependency across one edge.
///
/// `treat_as_aggregate` is true while walking `target` as a pure aggregate;
/// then restricted only reaches the dependency when the container itself is
/// licensed restricted.
pub fn target_conditions_propagating_to_dep(
    annotations: &EdgeAnnotations,
    target: &TargetNode,
    target_conditions: ConditionSet,
    treat_as_aggregate: bool,
) -> ConditionSet {
    if annotations.is_toolchain() {
        return ConditionSet::empty();
    }
    let result = target_conditions.difference(TARGET_ONLY);
    if treat_as_aggregate {
        if !target.license_conditions().matches_any(IMPLIES_RESTRICTED) {
            return result.difference(IMPLIES_RESTRICTED);
        }
        return result;
    }
    if annotations.is_derivation() {
        return result;
    }
    result.minus(LicenseCondition::RestrictedAllowsDynamicLinking)
}

/// Conditions of interest that still attach across an edge when collecting
/// actions.
pub fn conditions_attaching_across_edge(
    annotations: &EdgeAnnotations,
    universe: ConditionSet,
) -> ConditionSet {
    if annotations.is_toolchain() {
        return ConditionSet::empty();
    }
    if annotations.is_derivation() {
        return universe;
    }
    universe.intersection(LicenseCondition::Restricted.into())
}
