// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and edges.

use crate::binding::Binding;
use crate::edge::{Edge, EdgeError, EdgeId};
use crate::node::{Node, NodeId, PortLookupError};
use crate::port::PortId;
use crate::settings::ExecutionSettings;
use indexmap::IndexMap;
use std::collections::{HashMap, VecDeque};

/// A dataflow graph
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Edges between nodes
    edges: IndexMap<EdgeId, Edge>,
    /// Wiring and execution policies
    settings: ExecutionSettings,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty graph with the given policies
    pub fn with_settings(settings: ExecutionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Policies applied by this graph
    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and every edge touching it.
    ///
    /// Accepts a [`NodeId`] or a `&Node`. The node is handed back unchanged.
    pub fn remove_node(&mut self, node: impl Into<NodeId>) -> Option<Node> {
        let node_id = node.into();
        let removed = self.nodes.shift_remove(&node_id)?;

        let before = self.edges.len();
        self.edges.retain(|_, e| !e.involves_node(node_id));
        tracing::debug!(
            node = ?node_id,
            pruned = before - self.edges.len(),
            "removed node"
        );
        Some(removed)
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Replace the binding of a member node.
    ///
    /// Linking issues fresh port IDs, so every edge touching the node is
    /// removed and handed back for the caller to reconnect.
    pub fn relink(
        &mut self,
        node_id: NodeId,
        binding: &Binding,
    ) -> Result<Vec<Edge>, GraphError> {
        self.nodes
            .get_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?
            .link(binding);

        let (pruned, kept): (IndexMap<_, _>, IndexMap<_, _>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|(_, e)| e.involves_node(node_id));
        self.edges = kept;
        tracing::debug!(node = ?node_id, pruned = pruned.len(), "relinked node");
        Ok(pruned.into_values().collect())
    }

    /// Add an edge. Both endpoint nodes must already be in the graph and
    /// still own the edge's ports.
    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeId, GraphError> {
        for node_id in [edge.source_node(), edge.sink_node()] {
            if !self.nodes.contains_key(&node_id) {
                return Err(GraphError::NodeNotFound(node_id));
            }
        }
        if let Some(port) = self.missing_port(&edge) {
            return Err(GraphError::PortNotFound(port));
        }

        if !self.settings.allow_fan_in
            && self.edges.values().any(|e| e.sink_port() == edge.sink_port())
        {
            return Err(GraphError::PortAlreadyConnected(edge.sink_port()));
        }

        let id = edge.id();
        self.edges.insert(id, edge);
        Ok(id)
    }

    /// Connect an output of one node to an input of another by port label
    pub fn connect(
        &mut self,
        from_node: NodeId,
        from_port: &str,
        to_node: NodeId,
        to_port: &str,
    ) -> Result<EdgeId, GraphError> {
        let source = self
            .nodes
            .get(&from_node)
            .ok_or(GraphError::NodeNotFound(from_node))?
            .port(from_port)?;
        let sink = self
            .nodes
            .get(&to_node)
            .ok_or(GraphError::NodeNotFound(to_node))?
            .port(to_port)?;

        let edge = Edge::new(source, sink)?;
        self.add_edge(edge)
    }

    /// Remove an edge. Accepts an [`EdgeId`] or a `&Edge`.
    pub fn remove_edge(&mut self, edge: impl Into<EdgeId>) -> Option<Edge> {
        self.edges.shift_remove(&edge.into())
    }

    /// Get an edge by ID
    pub fn edge(&self, edge_id: EdgeId) -> Option<&Edge> {
        self.edges.get(&edge_id)
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Get edges terminating at a node
    pub fn edges_into(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.sink_node() == node_id)
    }

    /// Get edges leaving a node
    pub fn edges_from(&self, node_id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.values().filter(move |e| e.source_node() == node_id)
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// First endpoint port of `edge` its node no longer has
    pub(crate) fn missing_port(&self, edge: &Edge) -> Option<PortId> {
        let endpoints = [
            (edge.source_node(), edge.source_port()),
            (edge.sink_node(), edge.sink_port()),
        ];
        endpoints
            .into_iter()
            .find(|(node, port)| {
                self.nodes.get(node).and_then(|n| n.port_by_id(*port)).is_none()
            })
            .map(|(_, port)| port)
    }

    /// Compute an execution order with Kahn's algorithm.
    ///
    /// Ties are broken by node insertion order; outgoing edges are released in
    /// edge insertion order. A graph without nodes or without edges is
    /// rejected as empty.
    pub fn order(&self) -> Result<Vec<NodeId>, OrderError> {
        if self.nodes.is_empty() || self.edges.is_empty() {
            return Err(OrderError::EmptyNetwork);
        }

        let mut in_degree: IndexMap<NodeId, usize> =
            self.nodes.keys().map(|id| (*id, 0)).collect();
        let mut outgoing: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for edge in self.edges.values() {
            *in_degree.entry(edge.sink_node()).or_default() += 1;
            outgoing.entry(edge.source_node()).or_default().push(edge.sink_node());
        }

        let mut frontier: VecDeque<NodeId> = in_degree
            .iter()
            .filter(|&(_, degree)| *degree == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut remaining = self.edges.len();

        while let Some(node_id) = frontier.pop_front() {
            order.push(node_id);
            for target in outgoing.get(&node_id).into_iter().flatten() {
                remaining -= 1;
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        frontier.push_back(*target);
                    }
                }
            }
        }

        if remaining > 0 {
            let unresolved: Vec<NodeId> = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .map(|(id, _)| id)
                .collect();
            tracing::debug!(?unresolved, remaining, "cycle detected");
            return Err(OrderError::CircularReference { unresolved });
        }

        tracing::debug!(nodes = order.len(), "computed execution order");
        Ok(order)
    }
}

/// Error when wiring the graph
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node not in the graph
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Port lookup failed
    #[error(transparent)]
    Port(#[from] PortLookupError),

    /// Ports cannot be connected
    #[error(transparent)]
    Edge(#[from] EdgeError),

    /// Edge refers to a port its node does not have
    #[error("Port not found: {0:?}")]
    PortNotFound(PortId),

    /// Sink already has an incoming edge and fan-in is disabled
    #[error("Port already connected: {0:?}")]
    PortAlreadyConnected(PortId),
}

/// Error when ordering the graph
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// Graph has no nodes or no edges
    #[error("An operation was performed on an empty graph")]
    EmptyNetwork,

    /// Edges remain after sorting, so at least one cycle exists
    #[error("A circular dependency exists in the node graph: {unresolved:?}")]
    CircularReference {
        /// Nodes on or behind a cycle, in insertion order
        unresolved: Vec<NodeId>,
    },
}
