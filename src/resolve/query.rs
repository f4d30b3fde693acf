use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::graph::{LicenseGraph, NodeId};
use crate::license::condition::{ConditionSet, IMPLIES_NOTICE, IMPLIES_PRIVATE, IMPLIES_SHARED};
use crate::resolve::engine::{ResolutionStore, Resolver};
use crate::resolve::policy::conditions_attaching_across_edge;
use crate::resolve::shipped::ShippedSet;

/// Maps each node that must act to the conditions it resolves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionSet(BTreeMap<NodeId, ConditionSet>);

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `conditions` to those already recorded for `acts_on`.
    pub fn insert(&mut self, acts_on: NodeId, conditions: ConditionSet) {
        if conditions.is_empty() {
            return;
        }
        *self.0.entry(acts_on).or_default() |= conditions;
    }

    pub fn merge(&mut self, other: &ActionSet) {
        for (&acts_on, &conditions) in &other.0 {
            self.insert(acts_on, conditions);
        }
    }

    pub fn get(&self, acts_on: NodeId) -> ConditionSet {
        self.0.get(&acts_on).copied().unwrap_or_default()
    }

    pub fn acts_on(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, ConditionSet)> + '_ {
        self.0.iter().map(|(&id, &cs)| (id, cs))
    }

    /// Union of every recorded condition.
    pub fn conditions(&self) -> ConditionSet {
        self.0.values().fold(ConditionSet::empty(), |acc, &cs| acc | cs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Maps each distributed root to the actions its distribution triggers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSet(BTreeMap<NodeId, ActionSet>);

impl ResolutionSet {
    pub fn attaches_to(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.keys().copied()
    }

    pub fn actions(&self, attaches_to: NodeId) -> Option<&ActionSet> {
        self.0.get(&attaches_to)
    }

    /// Conditions `attaches_to` must resolve by acting on `acts_on`.
    pub fn resolves(&self, attaches_to: NodeId, acts_on: NodeId) -> ConditionSet {
        self.0
            .get(&attaches_to)
            .map(|actions| actions.get(acts_on))
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &ActionSet)> + '_ {
        self.0.iter().map(|(&id, actions)| (id, actions))
    }

    /// Every action regardless of which root triggered it.
    pub fn all_actions(&self) -> ActionSet {
        let mut all = ActionSet::new();
        for actions in self.0.values() {
            all.merge(actions);
        }
        all
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

struct QueryWalk<'a> {
    graph: &'a LicenseGraph,
    store: &'a ResolutionStore,
    shipped: &'a ShippedSet,
    walked: HashMap<(NodeId, ConditionSet), ActionSet>,
    ancestors: BTreeMap<NodeId, ActionSet>,
}

impl QueryWalk<'_> {
    /// Actions under `id` for the conditions still in play.
    ///
    /// Each (node, universe) pair is walked once; later arrivals reuse the
    /// recorded actions. A non-container node with shipped dependencies also
    /// keeps its own actions as an ancestor.
    ///
    /// Recursion depth follows the longest chain of shipped dependencies, as
    /// in the [`Resolver`] walks.
    fn walk(&mut self, id: NodeId, universe: ConditionSet) -> ActionSet {
        if let Some(actions) = self.walked.get(&(id, universe)) {
            return actions.clone();
        }

        let mut actions = ActionSet::new();
        actions.insert(id, self.store.resolution(id) & universe);

        let graph = self.graph;
        let mut ancestor = false;
        for edge in graph.edges_from(id) {
            let dep = edge.dependency();
            if !self.shipped.contains(dep) {
                continue;
            }
            ancestor = true;
            let attaching = conditions_attaching_across_edge(edge.annotations(), universe);
            if attaching.is_empty() {
                continue;
            }
            let below = self.walk(dep, attaching);
            actions.merge(&below);
        }

        if ancestor && !graph.node(id).is_container() && !actions.is_empty() {
            self.ancestors.entry(id).or_default().merge(&actions);
        }
        self.walked.insert((id, universe), actions.clone());
        actions
    }
}

/// Which shipped nodes each root, and each shipped non-container ancestor
/// below a root, must act on to resolve `conditions`.
pub fn walk_resolutions_for_condition(
    resolver: &mut Resolver<'_>,
    conditions: ConditionSet,
) -> ResolutionSet {
    let graph = resolver.graph();
    let store = resolver.resolve_top_down();
    let mut walk = QueryWalk {
        graph,
        store,
        shipped: graph.shipped(),
        walked: HashMap::new(),
        ancestors: BTreeMap::new(),
    };

    let mut result = BTreeMap::new();
    if conditions.is_empty() {
        return ResolutionSet(result);
    }
    for &root in graph.roots() {
        let actions = walk.walk(root, conditions);
        if !actions.is_empty() {
            result.insert(root, actions);
        }
    }
    for (id, actions) in walk.ancestors {
        result.entry(id).or_insert_with(ActionSet::new).merge(&actions);
    }
    ResolutionSet(result)
}

/// The flattened form of [`walk_resolutions_for_condition`].
pub fn walk_actions_for_condition(
    resolver: &mut Resolver<'_>,
    conditions: ConditionSet,
) -> ActionSet {
    walk_resolutions_for_condition(resolver, conditions).all_actions()
}

/// Who must ship notices for what.
pub fn resolve_notices(resolver: &mut Resolver<'_>) -> ResolutionSet {
    walk_resolutions_for_condition(resolver, IMPLIES_NOTICE)
}

/// Who must share source for what.
pub fn resolve_source_sharing(resolver: &mut Resolver<'_>) -> ResolutionSet {
    walk_resolutions_for_condition(resolver, IMPLIES_SHARED)
}

/// Who must keep source private for what.
pub fn resolve_source_privacy(resolver: &mut Resolver<'_>) -> ResolutionSet {
    walk_resolutions_for_condition(resolver, IMPLIES_PRIVATE)
}
