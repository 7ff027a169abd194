use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::core::edge::{Edge, EdgeKind};
use crate::core::node::{NodeId, Role};
use crate::error::{RagError, Result};

/// Authoritative owner of the nodes and typed edges of one resource
/// allocation graph.
///
/// Nodes and edges keep their insertion order; the deadlock detector relies
/// on that order to report the same cycle for the same graph.
#[derive(Debug, Default)]
pub struct ResourceGraph {
    graph: DiGraph<NodeId, EdgeKind>,
    node_map: HashMap<NodeId, NodeIndex>,
    process_count: u32,
    resource_count: u32,
    allocations: Vec<(NodeId, NodeId)>,
    requests: Vec<(NodeId, NodeId)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub role: Role,
}

/// Read-only export of the graph for renderers and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<Edge>,
    pub allocations: Vec<(NodeId, NodeId)>,
    pub requests: Vec<(NodeId, NodeId)>,
}

impl Snapshot {
    pub fn processes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.role == Role::Process)
            .map(|node| &node.id)
    }

    pub fn resources(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.role == Role::Resource)
            .map(|node| &node.id)
    }
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_process(&mut self) -> NodeId {
        self.process_count += 1;
        self.insert_node(NodeId::process(self.process_count))
    }

    pub fn add_resource(&mut self) -> NodeId {
        self.resource_count += 1;
        self.insert_node(NodeId::resource(self.resource_count))
    }

    fn insert_node(&mut self, id: NodeId) -> NodeId {
        let idx = self.graph.add_node(id);
        self.node_map.insert(id, idx);
        id
    }

    /// Inserts a directed edge of `kind`. Parallel edges are kept.
    ///
    /// Besides `UnknownNode`, this also fails with `MisdirectedEdge` when the
    /// endpoint roles contradict `kind`: allocations run resource to process,
    /// requests process to resource. That check is the one error kind here
    /// beyond unknown endpoints, and the auto-connector never trips it.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) -> Result<()> {
        let from_idx = self.index_of(&from)?;
        let to_idx = self.index_of(&to)?;
        if !Edge::new(from, to, kind).is_well_directed() {
            return Err(RagError::MisdirectedEdge { kind, from, to });
        }
        self.graph.add_edge(from_idx, to_idx, kind);
        Ok(())
    }

    /// Records that `resource` is held by `process`.
    pub fn allocate(&mut self, resource: NodeId, process: NodeId) -> Result<()> {
        self.add_edge(resource, process, EdgeKind::Allocation)?;
        self.allocations.push((resource, process));
        Ok(())
    }

    /// Records that `process` waits on `resource`.
    pub fn request(&mut self, process: NodeId, resource: NodeId) -> Result<()> {
        self.add_edge(process, resource, EdgeKind::Request)?;
        self.requests.push((process, resource));
        Ok(())
    }

    /// Replaces the store with a fresh, empty one; both counters restart.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn process_count(&self) -> u32 {
        self.process_count
    }

    pub fn resource_count(&self) -> u32 {
        self.resource_count
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices().map(move |idx| self.graph[idx])
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.graph.edge_references().map(move |edge| {
            Edge::new(
                self.graph[edge.source()],
                self.graph[edge.target()],
                *edge.weight(),
            )
        })
    }

    /// Outgoing edges of `id` as `(target, kind)` in insertion order.
    pub fn successors(&self, id: &NodeId) -> Vec<(NodeId, EdgeKind)> {
        let Some(&idx) = self.node_map.get(id) else {
            return Vec::new();
        };
        let mut out: Vec<_> = self.graph.edges(idx).collect();
        out.sort_by_key(|edge| edge.id());
        out.into_iter()
            .map(|edge| (self.graph[edge.target()], *edge.weight()))
            .collect()
    }

    pub fn allocations(&self) -> &[(NodeId, NodeId)] {
        &self.allocations
    }

    pub fn requests(&self) -> &[(NodeId, NodeId)] {
        &self.requests
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self
                .nodes()
                .map(|id| NodeView { id, role: id.role() })
                .collect(),
            edges: self.edges().collect(),
            allocations: self.allocations.clone(),
            requests: self.requests.clone(),
        }
    }

    fn index_of(&self, id: &NodeId) -> Result<NodeIndex> {
        self.node_map
            .get(id)
            .copied()
            .ok_or(RagError::UnknownNode(*id))
    }
}
