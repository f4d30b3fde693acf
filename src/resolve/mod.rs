//! Condition resolution over a [`LicenseGraph`](crate::graph::LicenseGraph).
//!
//! # Flow
//! 1. [`engine::Resolver::resolve_bottom_up`] — restricted conditions climb from
//!    dependencies into the targets that incorporate them.
//! 2. [`engine::Resolver::resolve_top_down`] — conditions descend from targets
//!    into their dependencies, aggregate-aware.
//! 3. [`shipped`] — which nodes are actually distributed.
//! 4. [`query`] — who must act on what, for a chosen set of conditions.
//! 5. [`conflict`] — combinations policy forbids.
//!
//! Edge rules used by every walk live in [`policy`].

pub mod conflict;
pub mod engine;
pub mod policy;
pub mod query;
pub mod shipped;
