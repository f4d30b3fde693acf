use std::collections::BTreeSet;

use serde::Serialize;

use crate::graph::{LicenseGraph, NodeId};

/// The nodes physically distributed: the roots and everything reached from
/// them through derivation edges only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShippedSet(BTreeSet<NodeId>);

impl ShippedSet {
    pub fn contains(&self, id: NodeId) -> bool {
        self.0.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members in node order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.0.iter().copied()
    }
}

impl LicenseGraph {
    /// The shipped set, computed on first use and cached on the graph.
    pub fn shipped(&self) -> &ShippedSet {
        self.shipped.get_or_init(|| walk_shipped(self))
    }
}

fn walk_shipped(graph: &LicenseGraph) -> ShippedSet {
    let mut shipped = BTreeSet::new();
    let mut stack: Vec<NodeId> = graph.roots().to_vec();
    while let Some(id) = stack.pop() {
        if !shipped.insert(id) {
            continue;
        }
        stack.extend(
            graph
                .edges_from(id)
                .filter(|e| e.annotations().is_derivation())
                .map(|e| e.dependency())
                .filter(|dep| !shipped.contains(dep)),
        );
    }
    ShippedSet(shipped)
}
