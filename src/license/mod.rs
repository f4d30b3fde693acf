//! License conditions and license-kind recognition.
//!
//! - [`condition`] — the closed table of [`LicenseCondition`](condition::LicenseCondition)s
//!   and the bitset [`ConditionSet`](condition::ConditionSet).
//! - [`spdx`] — parses license-kind tags and maps SPDX identifiers to conditions.
//! - [`classifier`] — infers a node's conditions from all of its kinds.

pub mod classifier;
pub mod condition;
pub mod spdx;
