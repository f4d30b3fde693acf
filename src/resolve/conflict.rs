use serde::Serialize;

use crate::graph::{LicenseGraph, NodeId};
use crate::license::condition::{ConditionSet, LicenseCondition, IMPLIES_PRIVATE, IMPLIES_SHARED};
use crate::resolve::engine::Resolver;
use crate::resolve::query::walk_actions_for_condition;

/// A combination of obligations on one shipped node that policy forbids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    /// Source must be both shared and kept private.
    SourceSharePrivacy {
        node: NodeId,
        share: ConditionSet,
        privacy: ConditionSet,
    },
    /// Code whose license is never allowed in a distribution.
    NotAllowed { node: NodeId },
}

impl Conflict {
    pub fn node(&self) -> NodeId {
        match self {
            Conflict::SourceSharePrivacy { node, .. } | Conflict::NotAllowed { node } => *node,
        }
    }

    pub fn describe(&self, graph: &LicenseGraph) -> String {
        let name = graph.node(self.node()).name();
        match self {
            Conflict::SourceSharePrivacy { share, privacy, .. } => format!(
                "{name} must share source ({share}) and keep source private ({privacy})"
            ),
            Conflict::NotAllowed { .. } => format!("{name} carries a not_allowed license"),
        }
    }
}

/// Every conflict among the shipped nodes, in node order.
pub fn conflicting_conditions(resolver: &mut Resolver<'_>) -> Vec<Conflict> {
    let not_allowed: ConditionSet = LicenseCondition::NotAllowed.into();
    let actions =
        walk_actions_for_condition(resolver, IMPLIES_SHARED | IMPLIES_PRIVATE | not_allowed);

    let mut conflicts = Vec::new();
    for (node, conditions) in actions.iter() {
        let share = conditions & IMPLIES_SHARED;
        let privacy = conditions & IMPLIES_PRIVATE;
        if !share.is_empty() && !privacy.is_empty() {
            conflicts.push(Conflict::SourceSharePrivacy {
                node,
                share,
                privacy,
            });
        }
        if conditions.contains(LicenseCondition::NotAllowed) {
            conflicts.push(Conflict::NotAllowed { node });
        }
    }
    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TargetNode;
    use LicenseCondition::*;

    #[test]
    fn test_restricted_into_proprietary_conflicts() {
        let graph = LicenseGraph::builder()
            .root("app")
            .node(TargetNode::new("app").with_conditions(Proprietary.into()))
            .node(TargetNode::new("libgpl").with_conditions(Restricted.into()))
            .edge("app", "libgpl", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        let conflicts = conflicting_conditions(&mut resolver);

        let app = graph.find("app").unwrap();
        assert_eq!(
            conflicts,
            vec![Conflict::SourceSharePrivacy {
                node: app,
                share: Restricted.into(),
                privacy: Proprietary.into(),
            }]
        );
        assert_eq!(
            conflicts[0].describe(&graph),
            "app must share source (restricted) and keep source private (proprietary)"
        );
    }

    #[test]
    fn test_lgpl_dynamic_into_proprietary_is_fine() {
        let graph = LicenseGraph::builder()
            .root("app")
            .node(TargetNode::new("app").with_conditions(Proprietary.into()))
            .node(TargetNode::new("liblgpl").with_conditions(RestrictedAllowsDynamicLinking.into()))
            .edge("app", "liblgpl", ["dynamic"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        assert!(conflicting_conditions(&mut resolver).is_empty());
    }

    #[test]
    fn test_not_allowed_reported() {
        let graph = LicenseGraph::builder()
            .root("img")
            .node(TargetNode::new("img").container())
            .node(TargetNode::new("blob").with_conditions(NotAllowed.into()))
            .edge("img", "blob", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        let conflicts = conflicting_conditions(&mut resolver);
        assert_eq!(conflicts, vec![Conflict::NotAllowed { node: graph.find("blob").unwrap() }]);
    }
}
