use tracing::info;

use crate::graph::{LicenseGraph, NodeId};
use crate::license::condition::ConditionSet;
use crate::resolve::policy::{
    dep_conditions_propagating_to_target, target_conditions_propagating_to_dep,
};

/// The context a node was walked in.
///
/// A node walked as part of a pure aggregate must be walked again when it is
/// later reached outside one; the reverse is a cache hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Aggregate,
    NonAggregate,
}

impl Visit {
    fn of(aggregate: bool) -> Self {
        if aggregate {
            Visit::Aggregate
        } else {
            Visit::NonAggregate
        }
    }

    pub fn is_aggregate(self) -> bool {
        self == Visit::Aggregate
    }

    /// Whether a prior visit in context `self` already covers a visit in `next`.
    fn covers(self, next: Visit) -> bool {
        self == Visit::NonAggregate || next == Visit::Aggregate
    }

    /// The context after visiting again in `next`; never upgrades.
    fn downgrade(self, next: Visit) -> Visit {
        if self == Visit::NonAggregate {
            Visit::NonAggregate
        } else {
            next
        }
    }
}

/// Per-node results of the resolution passes, indexed by [`NodeId`].
///
/// Kept apart from the graph so the graph itself stays immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionStore {
    resolution: Vec<ConditionSet>,
    pure: Vec<bool>,
}

impl ResolutionStore {
    fn new(len: usize) -> Self {
        ResolutionStore {
            resolution: vec![ConditionSet::empty(); len],
            pure: vec![false; len],
        }
    }

    /// Cumulative resolved conditions of `id`.
    pub fn resolution(&self, id: NodeId) -> ConditionSet {
        self.resolution[id.index()]
    }

    /// True when the last walk of `id` treated it as part of a pure aggregate.
    pub fn is_pure(&self, id: NodeId) -> bool {
        self.pure[id.index()]
    }

    fn record(&mut self, id: NodeId, conditions: ConditionSet, visit: Visit) {
        self.resolution[id.index()] = conditions;
        self.pure[id.index()] = visit.is_aggregate();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Unresolved,
    BottomUp,
    TopDown,
}

/// Runs the bottom-up and then the top-down resolution pass over a graph.
///
/// Each pass runs at most once; asking for the top-down result first runs the
/// bottom-up pass. Walks are single-threaded and recursive, one stack frame
/// per edge on the longest root-to-leaf path; build dependency chains are
/// expected to stay within a few thousand links.
#[derive(Debug)]
pub struct Resolver<'g> {
    graph: &'g LicenseGraph,
    store: ResolutionStore,
    stage: Stage,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g LicenseGraph) -> Self {
        Resolver {
            graph,
            store: ResolutionStore::new(graph.len()),
            stage: Stage::Unresolved,
        }
    }

    pub fn graph(&self) -> &'g LicenseGraph {
        self.graph
    }

    /// Results so far, whichever passes have run.
    pub fn store(&self) -> &ResolutionStore {
        &self.store
    }

    /// Discard all results.
    pub fn reset(&mut self) {
        self.store = ResolutionStore::new(self.graph.len());
        self.stage = Stage::Unresolved;
    }

    /// Propagate conditions from dependencies up to the targets that use them.
    pub fn resolve_bottom_up(&mut self) -> &ResolutionStore {
        if self.stage < Stage::BottomUp {
            self.run_bottom_up();
            self.stage = Stage::BottomUp;
            info!(nodes = self.graph.len(), "resolved license conditions bottom-up");
        }
        &self.store
    }

    /// Propagate conditions from targets down to their dependencies, after
    /// the bottom-up pass.
    pub fn resolve_top_down(&mut self) -> &ResolutionStore {
        self.resolve_bottom_up();
        if self.stage < Stage::TopDown {
            self.run_top_down();
            self.stage = Stage::TopDown;
            info!(nodes = self.graph.len(), "resolved license conditions top-down");
        }
        &self.store
    }

    fn run_bottom_up(&mut self) {
        let graph = self.graph;
        let mut walked: Vec<Option<Visit>> = vec![None; graph.len()];
        for &root in graph.roots() {
            let visit = Visit::of(graph.node(root).is_container());
            self.walk_bottom_up(root, visit, &mut walked);
        }
    }

    fn walk_bottom_up(
        &mut self,
        id: NodeId,
        visit: Visit,
        walked: &mut [Option<Visit>],
    ) -> ConditionSet {
        if let Some(prior) = walked[id.index()] {
            if prior.covers(visit) {
                return self.store.resolution(id);
            }
        }
        let visit = walked[id.index()].map_or(visit, |prior| prior.downgrade(visit));
        walked[id.index()] = Some(visit);

        let graph = self.graph;
        let mut conditions = graph.node(id).license_conditions() | self.store.resolution(id);
        for edge in graph.edges_from(id) {
            let dep = edge.dependency();
            let dep_visit = Visit::of(visit.is_aggregate() && graph.node(dep).is_container());
            let dep_conditions = self.walk_bottom_up(dep, dep_visit, walked);
            conditions |= dep_conditions_propagating_to_target(
                edge.annotations(),
                graph.node(dep),
                dep_conditions,
            );
        }
        self.store.record(id, conditions, visit);
        conditions
    }

    fn run_top_down(&mut self) {
        let graph = self.graph;
        let mut walked: Vec<Option<Visit>> = vec![None; graph.len()];
        for &root in graph.roots() {
            let visit = Visit::of(graph.node(root).is_container());
            let carried = self.store.resolution(root);
            self.walk_top_down(root, carried, visit, &mut walked);
        }
    }

    fn walk_top_down(
        &mut self,
        id: NodeId,
        carried: ConditionSet,
        visit: Visit,
        walked: &mut [Option<Visit>],
    ) {
        let known = self.store.resolution(id);
        if let Some(prior) = walked[id.index()] {
            if prior.covers(visit) && carried.is_subset_of(known) {
                return;
            }
        }
        let visit = walked[id.index()].map_or(visit, |prior| prior.downgrade(visit));
        walked[id.index()] = Some(visit);

        let conditions = known | carried;
        self.store.record(id, conditions, visit);

        let graph = self.graph;
        let target = graph.node(id);
        for edge in graph.edges_from(id) {
            let dep = edge.dependency();
            let dep_conditions = target_conditions_propagating_to_dep(
                edge.annotations(),
                target,
                conditions,
                visit.is_aggregate(),
            );
            let dep_visit = Visit::of(visit.is_aggregate() && graph.node(dep).is_container());
            self.walk_top_down(dep, dep_conditions, dep_visit, walked);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TargetNode;
    use crate::license::condition::LicenseCondition::*;

    fn resolution(resolver: &Resolver, name: &str) -> ConditionSet {
        let id = resolver.graph().find(name).unwrap();
        resolver.store().resolution(id)
    }

    fn static_gpl() -> LicenseGraph {
        LicenseGraph::builder()
            .root("binA")
            .node(TargetNode::new("binA").with_conditions(Notice.into()))
            .node(TargetNode::new("libGPL").with_conditions(Restricted.into()))
            .edge("binA", "libGPL", ["static"])
            .build()
            .unwrap()
    }

    /// An image bundling a nested container, which a binary outside the
    /// image also links statically.
    fn mixed_aggregate() -> LicenseGraph {
        LicenseGraph::builder()
            .root("img")
            .root("tool")
            .node(TargetNode::new("img").container().with_conditions(Notice.into()))
            .node(TargetNode::new("bundle").container().with_conditions(Notice.into()))
            .node(TargetNode::new("apache").with_conditions(Notice.into()))
            .node(TargetNode::new("gpl").with_conditions(Restricted.into()))
            .node(TargetNode::new("tool").with_conditions(Notice.into()))
            .edge("img", "bundle", ["static"])
            .edge("bundle", "apache", ["static"])
            .edge("bundle", "gpl", ["static"])
            .edge("tool", "bundle", ["static"])
            .build()
            .unwrap()
    }

    #[test]
    fn test_static_restricted_reaches_target() {
        let graph = static_gpl();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "binA"), ConditionSet::of(&[Notice, Restricted]));
        assert_eq!(resolution(&resolver, "libGPL"), Restricted.into());
    }

    #[test]
    fn test_dynamic_weak_restricted_stays_local() {
        let graph = LicenseGraph::builder()
            .root("binA")
            .node(TargetNode::new("binA").with_conditions(Notice.into()))
            .node(TargetNode::new("libLGPL").with_conditions(RestrictedAllowsDynamicLinking.into()))
            .edge("binA", "libLGPL", ["dynamic"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "binA"), Notice.into());
        assert_eq!(resolution(&resolver, "libLGPL"), RestrictedAllowsDynamicLinking.into());
    }

    #[test]
    fn test_static_weak_restricted_reaches_target() {
        let graph = LicenseGraph::builder()
            .root("binA")
            .node(TargetNode::new("binA"))
            .node(TargetNode::new("libLGPL").with_conditions(RestrictedAllowsDynamicLinking.into()))
            .edge("binA", "libLGPL", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_bottom_up();
        assert_eq!(resolution(&resolver, "binA"), RestrictedAllowsDynamicLinking.into());
    }

    #[test]
    fn test_toolchain_isolation() {
        let graph = LicenseGraph::builder()
            .root("binT")
            .node(TargetNode::new("binT").with_conditions(Notice.into()))
            .node(TargetNode::new("gcc").with_conditions(Restricted.into()))
            .edge("binT", "gcc", ["toolchain"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "binT"), Notice.into());
        assert_eq!(resolution(&resolver, "gcc"), Restricted.into());
    }

    #[test]
    fn test_toolchain_isolation_with_dynamic_annotation() {
        let graph = LicenseGraph::builder()
            .root("binT")
            .node(TargetNode::new("binT").with_conditions(Notice.into()))
            .node(TargetNode::new("gcc").with_conditions(Restricted.into()))
            .edge("binT", "gcc", ["toolchain", "dynamic"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "binT"), Notice.into());
        assert_eq!(resolution(&resolver, "gcc"), Restricted.into());
    }

    #[test]
    fn test_aggregate_does_not_spread_restricted() {
        let graph = LicenseGraph::builder()
            .root("img")
            .node(TargetNode::new("img").container().with_conditions(Notice.into()))
            .node(TargetNode::new("apache").with_conditions(Notice.into()))
            .node(TargetNode::new("gpl").with_conditions(Restricted.into()))
            .edge("img", "apache", ["static"])
            .edge("img", "gpl", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "img"), ConditionSet::of(&[Notice, Restricted]));
        assert_eq!(resolution(&resolver, "apache"), Notice.into());
        assert_eq!(resolution(&resolver, "gpl"), Restricted.into());
        let img = graph.find("img").unwrap();
        assert!(resolver.store().is_pure(img));
    }

    #[test]
    fn test_restricted_container_spreads_restricted() {
        let graph = LicenseGraph::builder()
            .root("img")
            .node(TargetNode::new("img").container().with_conditions(Restricted.into()))
            .node(TargetNode::new("apache").with_conditions(Notice.into()))
            .edge("img", "apache", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "apache"), ConditionSet::of(&[Notice, Restricted]));
    }

    #[test]
    fn test_restricted_flows_down_derivation_chain() {
        let graph = LicenseGraph::builder()
            .root("bin")
            .node(TargetNode::new("bin"))
            .node(TargetNode::new("libx").with_conditions(Notice.into()))
            .node(TargetNode::new("liby").with_conditions(Restricted.into()))
            .node(TargetNode::new("libz").with_conditions(Notice.into()))
            .edge("bin", "libx", ["static"])
            .edge("libx", "liby", ["static"])
            .edge("libx", "libz", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "bin"), Restricted.into());
        assert_eq!(resolution(&resolver, "libx"), ConditionSet::of(&[Notice, Restricted]));
        assert_eq!(resolution(&resolver, "libz"), ConditionSet::of(&[Notice, Restricted]));
    }

    #[test]
    fn test_aggregate_node_revisited_outside_aggregate() {
        let graph = mixed_aggregate();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();

        assert_eq!(resolution(&resolver, "bundle"), ConditionSet::of(&[Notice, Restricted]));
        assert_eq!(resolution(&resolver, "tool"), ConditionSet::of(&[Notice, Restricted]));
        // `tool` is a derivative of `bundle`, so the bundle is not a pure
        // aggregate on that path and restricted reaches everything in it.
        assert_eq!(resolution(&resolver, "apache"), ConditionSet::of(&[Notice, Restricted]));
        assert!(!resolver.store().is_pure(graph.find("bundle").unwrap()));
        assert!(resolver.store().is_pure(graph.find("img").unwrap()));
    }

    #[test]
    fn test_aggregate_only_path_keeps_bundle_pure() {
        let graph = LicenseGraph::builder()
            .root("img")
            .node(TargetNode::new("img").container().with_conditions(Notice.into()))
            .node(TargetNode::new("bundle").container().with_conditions(Notice.into()))
            .node(TargetNode::new("apache").with_conditions(Notice.into()))
            .node(TargetNode::new("gpl").with_conditions(Restricted.into()))
            .edge("img", "bundle", ["static"])
            .edge("bundle", "apache", ["static"])
            .edge("bundle", "gpl", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        assert_eq!(resolution(&resolver, "apache"), Notice.into());
        assert!(resolver.store().is_pure(graph.find("bundle").unwrap()));
    }

    #[test]
    fn test_nested_containers_stay_pure() {
        let graph = LicenseGraph::builder()
            .root("outer")
            .node(TargetNode::new("outer").container())
            .node(TargetNode::new("inner").container())
            .node(TargetNode::new("lib").with_conditions(Notice.into()))
            .edge("outer", "inner", ["static"])
            .edge("inner", "lib", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        resolver.resolve_top_down();
        let store = resolver.store();
        assert!(store.is_pure(graph.find("outer").unwrap()));
        assert!(store.is_pure(graph.find("inner").unwrap()));
        assert!(!store.is_pure(graph.find("lib").unwrap()));
    }

    #[test]
    fn test_passes_are_idempotent() {
        let graph = mixed_aggregate();
        let mut resolver = Resolver::new(&graph);

        let once = resolver.resolve_bottom_up().clone();
        resolver.run_bottom_up();
        assert_eq!(resolver.store(), &once);
        assert_eq!(resolver.resolve_bottom_up(), &once);

        let once = resolver.resolve_top_down().clone();
        resolver.run_top_down();
        assert_eq!(resolver.store(), &once);
        assert_eq!(resolver.resolve_top_down(), &once);
    }

    #[test]
    fn test_top_down_is_monotonic() {
        let graph = mixed_aggregate();
        let mut resolver = Resolver::new(&graph);
        let bottom_up = resolver.resolve_bottom_up().clone();
        let top_down = resolver.resolve_top_down();
        for id in graph.node_ids() {
            assert!(bottom_up.resolution(id).is_subset_of(top_down.resolution(id)));
        }
    }

    #[test]
    fn test_top_down_runs_bottom_up_first() {
        let graph = static_gpl();
        let mut resolver = Resolver::new(&graph);
        let direct = resolver.resolve_top_down().clone();

        resolver.reset();
        assert!(resolver.store().resolution(graph.find("binA").unwrap()).is_empty());
        resolver.resolve_bottom_up();
        assert_eq!(resolver.resolve_top_down(), &direct);
    }
}
