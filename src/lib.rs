//! `compliance-checkr` — resolve license compliance obligations across a build
//! dependency graph.
//!
//! # Flow
//! 1. Read license metadata reachable from the root files into a
//!    [`LicenseGraph`] ([`graph::reader::read_license_graph`]).
//! 2. Resolve conditions bottom-up, then top-down ([`Resolver`]).
//! 3. Compute the shipped set ([`LicenseGraph::shipped`]).
//! 4. Ask who must act on what ([`resolve::query`]) and which combinations
//!    are forbidden ([`resolve::conflict`]).

pub mod config;
pub mod error;
pub mod graph;
pub mod license;
pub mod resolve;

pub use error::ReadError;
pub use graph::reader::{read_license_graph, ReaderOptions};
pub use graph::source::{FsSource, MemorySource, MetadataSource};
pub use graph::{EdgeAnnotations, LicenseGraph, NodeId, TargetEdge, TargetNode};
pub use license::condition::{
    ConditionSet, LicenseCondition, IMPLIES_BY_EXCEPTION_ONLY, IMPLIES_NOTICE, IMPLIES_PRIVATE,
    IMPLIES_RESTRICTED, IMPLIES_SHARED,
};
pub use resolve::conflict::{conflicting_conditions, Conflict};
pub use resolve::engine::{ResolutionStore, Resolver};
pub use resolve::query::{
    resolve_notices, resolve_source_privacy, resolve_source_sharing,
    walk_actions_for_condition, walk_resolutions_for_condition, ActionSet, ResolutionSet,
};
pub use resolve::shipped::ShippedSet;
