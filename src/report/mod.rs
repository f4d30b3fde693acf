//! Report rows for the command-line front end.
//!
//! Rows are plain serializable values: [`terminal`] renders them as tables,
//! `--report json` prints them with `serde_json`.

pub mod terminal;

use serde::Serialize;

use compliance_checkr::{Conflict, ConditionSet, LicenseGraph, ResolutionSet, Resolver};

#[derive(Debug, Serialize)]
pub struct NodeRow {
    pub name: String,
    pub package: String,
    pub conditions: ConditionSet,
    pub shipped: bool,
    pub pure: bool,
}

#[derive(Debug, Serialize)]
pub struct ShippedRow {
    pub name: String,
    pub package: String,
    pub installed: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionRow {
    pub attaches_to: String,
    pub acts_on: String,
    pub conditions: ConditionSet,
    pub license_texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ConflictRow {
    pub node: String,
    pub conflict: Conflict,
    pub description: String,
}

/// Every node with its resolution, in name order.
pub fn node_rows(resolver: &mut Resolver<'_>) -> Vec<NodeRow> {
    let graph = resolver.graph();
    let store = resolver.resolve_top_down();
    graph
        .nodes()
        .map(|(id, node)| NodeRow {
            name: node.name().to_string(),
            package: node.package_name().to_string(),
            conditions: store.resolution(id),
            shipped: graph.shipped().contains(id),
            pure: store.is_pure(id),
        })
        .collect()
}

pub fn shipped_rows(graph: &LicenseGraph) -> Vec<ShippedRow> {
    graph
        .shipped()
        .iter()
        .map(|id| {
            let node = graph.node(id);
            ShippedRow {
                name: node.name().to_string(),
                package: node.package_name().to_string(),
                installed: node.installed_in_container(),
            }
        })
        .collect()
}

pub fn action_rows(graph: &LicenseGraph, resolutions: &ResolutionSet) -> Vec<ActionRow> {
    resolutions
        .iter()
        .flat_map(|(attaches_to, actions)| {
            actions.iter().map(move |(acts_on, conditions)| ActionRow {
                attaches_to: graph.node(attaches_to).name().to_string(),
                acts_on: graph.node(acts_on).name().to_string(),
                conditions,
                license_texts: graph.node(acts_on).license_texts().to_vec(),
            })
        })
        .collect()
}

pub fn conflict_rows(graph: &LicenseGraph, conflicts: Vec<Conflict>) -> Vec<ConflictRow> {
    conflicts
        .into_iter()
        .map(|conflict| ConflictRow {
            node: graph.node(conflict.node()).name().to_string(),
            description: conflict.describe(graph),
            conflict,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use compliance_checkr::{resolve_source_sharing, LicenseCondition, TargetNode};

    #[test]
    fn test_action_rows_name_nodes() {
        let graph = LicenseGraph::builder()
            .root("bin")
            .node(TargetNode::new("bin"))
            .node(TargetNode::new("libgpl").with_conditions(LicenseCondition::Restricted.into()))
            .edge("bin", "libgpl", ["static"])
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        let rows = action_rows(&graph, &resolve_source_sharing(&mut resolver));

        let pairs: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.attaches_to.as_str(), r.acts_on.as_str()))
            .collect();
        assert_eq!(pairs, vec![("bin", "bin"), ("bin", "libgpl")]);
    }

    #[test]
    fn test_node_rows_json() {
        let graph = LicenseGraph::builder()
            .root("bin")
            .node(TargetNode::new("bin").with_conditions(LicenseCondition::Notice.into()))
            .build()
            .unwrap();
        let mut resolver = Resolver::new(&graph);
        let json = serde_json::to_value(node_rows(&mut resolver)).unwrap();
        assert_eq!(json[0]["name"], "bin");
        assert_eq!(json[0]["conditions"], serde_json::json!(["notice"]));
        assert_eq!(json[0]["shipped"], true);
    }
}
