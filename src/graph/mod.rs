//! The license graph: target nodes, annotated dependency edges, and the
//! read-only structure the resolution passes walk.
//!
//! - [`record`] — the per-target license metadata record.
//! - [`source`] — where metadata files are read from.
//! - [`reader`] — concurrent assembly of a [`LicenseGraph`] from root files.

pub mod reader;
pub mod record;
pub mod source;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::error::ReadError;
use crate::graph::record::{InstallMap, LicenseMetadata};
use crate::license::classifier::{classify_kinds, is_classpath_exception_only, KindOverrides};
use crate::license::condition::ConditionSet;
use crate::resolve::shipped::ShippedSet;

/// Stable index of a node within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One build target, as described by its license metadata file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TargetNode {
    name: String,
    package_name: String,
    module_types: Vec<String>,
    module_classes: Vec<String>,
    license_kinds: Vec<String>,
    license_conditions: ConditionSet,
    license_texts: Vec<String>,
    built: Vec<String>,
    installed: Vec<String>,
    install_map: Vec<InstallMap>,
    sources: Vec<String>,
    is_container: bool,
    #[serde(skip)]
    classpath_exception_only: bool,
}

impl TargetNode {
    /// A bare node with no conditions and no outputs.
    pub fn new(name: impl Into<String>) -> Self {
        TargetNode {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Build a node from a parsed record.
    ///
    /// Declared condition names outside the recognized table are dropped. When
    /// `infer` is set and the record declares no conditions at all, conditions
    /// are inferred from its license kinds.
    pub fn from_metadata(
        name: impl Into<String>,
        record: LicenseMetadata,
        infer: bool,
        overrides: &KindOverrides,
    ) -> Self {
        let mut conditions = ConditionSet::from_names(&record.license_conditions);
        if infer && record.license_conditions.is_empty() {
            conditions = classify_kinds(&record.license_kinds, overrides);
        }
        let classpath_exception_only = is_classpath_exception_only(&record.license_kinds);

        TargetNode {
            name: name.into(),
            package_name: record.package_name,
            module_types: record.module_types,
            module_classes: record.module_classes,
            license_kinds: record.license_kinds,
            license_conditions: conditions,
            license_texts: record.license_texts,
            built: record.built,
            installed: record.installed,
            install_map: record.install_map,
            sources: record.sources,
            is_container: record.is_container,
            classpath_exception_only,
        }
    }

    pub fn with_conditions(mut self, conditions: ConditionSet) -> Self {
        self.license_conditions = conditions;
        self
    }

    pub fn with_kinds<S: Into<String>>(mut self, kinds: impl IntoIterator<Item = S>) -> Self {
        self.license_kinds = kinds.into_iter().map(Into::into).collect();
        self.classpath_exception_only = is_classpath_exception_only(&self.license_kinds);
        self
    }

    pub fn with_installed<S: Into<String>>(mut self, paths: impl IntoIterator<Item = S>) -> Self {
        self.installed = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_install_map(mut self, install_map: Vec<InstallMap>) -> Self {
        self.install_map = install_map;
        self
    }

    pub fn container(mut self) -> Self {
        self.is_container = true;
        self
    }

    /// The metadata file path; unique within a graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn module_types(&self) -> &[String] {
        &self.module_types
    }

    pub fn module_classes(&self) -> &[String] {
        &self.module_classes
    }

    pub fn license_kinds(&self) -> &[String] {
        &self.license_kinds
    }

    /// Conditions originating at this node.
    pub fn license_conditions(&self) -> ConditionSet {
        self.license_conditions
    }

    pub fn license_texts(&self) -> &[String] {
        &self.license_texts
    }

    pub fn built(&self) -> &[String] {
        &self.built
    }

    pub fn installed(&self) -> &[String] {
        &self.installed
    }

    pub fn install_map(&self) -> &[InstallMap] {
        &self.install_map
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// True for a pure aggregate such as a disk image or archive.
    pub fn is_container(&self) -> bool {
        self.is_container
    }

    /// True when the only restricted license kinds carry the classpath exception.
    pub fn is_classpath_exception_only(&self) -> bool {
        self.classpath_exception_only
    }

    /// Installed paths rewritten through the install map.
    ///
    /// The first entry whose `from_path` prefixes a path replaces that prefix;
    /// unmatched paths are returned unchanged.
    pub fn installed_in_container(&self) -> Vec<String> {
        self.installed
            .iter()
            .map(|path| {
                self.install_map
                    .iter()
                    .find_map(|m| {
                        path.strip_prefix(m.from_path.as_str())
                            .map(|rest| format!("{}{}", m.container_path, rest))
                    })
                    .unwrap_or_else(|| path.clone())
            })
            .collect()
    }
}

/// The annotations on a dependency edge.
///
/// `static`, `dynamic` and `toolchain` are policy-relevant; anything else is
/// preserved but ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct EdgeAnnotations(BTreeSet<String>);

impl EdgeAnnotations {
    pub fn new<S: Into<String>>(annotations: impl IntoIterator<Item = S>) -> Self {
        EdgeAnnotations(annotations.into_iter().map(Into::into).collect())
    }

    pub fn has(&self, annotation: &str) -> bool {
        self.0.contains(annotation)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_dynamic(&self) -> bool {
        self.has("dynamic")
    }

    pub fn is_toolchain(&self) -> bool {
        self.has("toolchain")
    }

    /// A derivation edge includes the dependency into the target's work:
    /// neither dynamic nor toolchain.
    pub fn is_derivation(&self) -> bool {
        !self.is_dynamic() && !self.is_toolchain()
    }
}

impl fmt::Display for EdgeAnnotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "{}", names.join(","))
    }
}

/// A directed edge from a target to one of its dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetEdge {
    target: NodeId,
    dependency: NodeId,
    annotations: EdgeAnnotations,
}

impl TargetEdge {
    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn dependency(&self) -> NodeId {
        self.dependency
    }

    pub fn annotations(&self) -> &EdgeAnnotations {
        &self.annotations
    }
}

/// An immutable dependency graph of license metadata.
#[derive(Debug)]
pub struct LicenseGraph {
    root_files: Vec<String>,
    roots: Vec<NodeId>,
    nodes: Vec<TargetNode>,
    by_name: HashMap<String, NodeId>,
    edges: Vec<TargetEdge>,
    forward: Vec<Vec<usize>>,
    pub(crate) shipped: OnceLock<ShippedSet>,
}

impl LicenseGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    pub fn root_files(&self) -> &[String] {
        &self.root_files
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Look up a node. Panics if `id` does not belong to this graph.
    pub fn node(&self, id: NodeId) -> &TargetNode {
        self.nodes
            .get(id.0)
            .unwrap_or_else(|| panic!("node {} is not in this license graph", id.0))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TargetNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub fn edges(&self) -> &[TargetEdge] {
        &self.edges
    }

    /// Outgoing edges of `id`, ordered by dependency name.
    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = &TargetEdge> {
        self.forward[id.0].iter().map(move |&e| &self.edges[e])
    }

    /// Reject dependency cycles, naming the first one found.
    fn check_acyclic(&self) -> Result<(), ReadError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        let mut marks = vec![Mark::Unvisited; self.nodes.len()];
        // Each frame is a node on the current path and the next edge to try.
        let mut path: Vec<(NodeId, usize)> = Vec::new();
        for start in self.node_ids() {
            if marks[start.0] != Mark::Unvisited {
                continue;
            }
            marks[start.0] = Mark::Active;
            path.push((start, 0));

            while let Some(frame) = path.last_mut() {
                let (id, next) = *frame;
                let Some(&edge) = self.forward[id.0].get(next) else {
                    marks[id.0] = Mark::Done;
                    path.pop();
                    continue;
                };
                frame.1 += 1;

                let dep = self.edges[edge].dependency;
                match marks[dep.0] {
                    Mark::Done => {}
                    Mark::Active => {
                        let first = path.iter().position(|&(n, _)| n == dep).unwrap_or(0);
                        let mut cycle: Vec<String> = path[first..]
                            .iter()
                            .map(|&(n, _)| self.node(n).name.clone())
                            .collect();
                        cycle.push(self.node(dep).name.clone());
                        return Err(ReadError::Cycle(cycle));
                    }
                    Mark::Unvisited => {
                        marks[dep.0] = Mark::Active;
                        path.push((dep, 0));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Collects nodes and edges by name, then freezes them into a [`LicenseGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    root_files: Vec<String>,
    nodes: HashMap<String, TargetNode>,
    edges: Vec<(String, String, EdgeAnnotations)>,
}

impl GraphBuilder {
    pub fn root(mut self, name: impl Into<String>) -> Self {
        self.add_root(name);
        self
    }

    pub fn node(mut self, node: TargetNode) -> Self {
        self.add_node(node);
        self
    }

    pub fn edge<S: Into<String>>(
        mut self,
        target: &str,
        dependency: &str,
        annotations: impl IntoIterator<Item = S>,
    ) -> Self {
        self.add_edge(target, dependency, EdgeAnnotations::new(annotations));
        self
    }

    pub fn add_root(&mut self, name: impl Into<String>) {
        self.root_files.push(name.into());
    }

    pub fn add_node(&mut self, node: TargetNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn add_edge(&mut self, target: &str, dependency: &str, annotations: EdgeAnnotations) {
        self.edges
            .push((target.to_string(), dependency.to_string(), annotations));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Freeze into a graph.
    ///
    /// Nodes are indexed in name order so that every walk is deterministic.
    /// Fails if a root or an edge endpoint has no node, or if the edges form
    /// a cycle.
    pub fn build(self) -> Result<LicenseGraph, ReadError> {
        if self.root_files.is_empty() {
            return Err(ReadError::NoRoots);
        }

        let mut nodes: Vec<TargetNode> = self.nodes.into_values().collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        let by_name: HashMap<String, NodeId> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.name.clone(), NodeId(i)))
            .collect();

        let mut edges = Vec::with_capacity(self.edges.len());
        for (target, dependency, annotations) in self.edges {
            let target_id = by_name.get(&target).copied();
            let dependency_id = by_name.get(&dependency).copied();
            match (target_id, dependency_id) {
                (Some(t), Some(d)) => edges.push(TargetEdge {
                    target: t,
                    dependency: d,
                    annotations,
                }),
                _ => {
                    return Err(ReadError::UnknownDependency { target, dependency });
                }
            }
        }
        edges.sort_by(|a, b| {
            (a.target, a.dependency).cmp(&(b.target, b.dependency))
        });

        let mut forward = vec![Vec::new(); nodes.len()];
        for (i, edge) in edges.iter().enumerate() {
            forward[edge.target.0].push(i);
        }

        let mut roots = Vec::with_capacity(self.root_files.len());
        for file in &self.root_files {
            match by_name.get(file) {
                Some(&id) => {
                    if !roots.contains(&id) {
                        roots.push(id);
                    }
                }
                None => {
                    return Err(ReadError::UnknownDependency {
                        target: "<root>".to_string(),
                        dependency: file.clone(),
                    })
                }
            }
        }

        let graph = LicenseGraph {
            root_files: self.root_files,
            roots,
            nodes,
            by_name,
            edges,
            forward,
            shipped: OnceLock::new(),
        };
        graph.check_acyclic()?;
        Ok(graph)
    }
}
