// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph execution.
//!
//! A run computes the full execution order first, then executes each node
//! once in that order. Values travel along edges by snapshotting each source
//! port right before the consuming node runs.

use crate::binding::CallError;
use crate::edge::{EdgeId, Inbound};
use crate::graph::{Graph, OrderError};
use crate::node::NodeId;
use crate::port::{Port, PortId};
use std::collections::HashMap;

impl Graph {
    /// Execute every node once in topological order.
    ///
    /// Every edge must still resolve to ports on its nodes before any node
    /// runs. The first failing node aborts the run. Nodes that already ran
    /// keep their port values. Returns the order the nodes were executed in.
    pub fn run(&mut self) -> Result<Vec<NodeId>, RunError> {
        let order = self.order()?;

        for edge in self.edges() {
            if let Some(port) = self.missing_port(edge) {
                return Err(RunError::DanglingEdge { edge: edge.id(), port });
            }
        }

        let mut inbound: HashMap<NodeId, Vec<EdgeId>> = HashMap::new();
        for edge in self.edges() {
            inbound.entry(edge.sink_node()).or_default().push(edge.id());
        }

        let arity = self.settings().arity;
        for &node_id in &order {
            let edges = inbound.get(&node_id).map(Vec::as_slice).unwrap_or_default();
            let incoming = self.collect_inbound(edges);

            let Some(node) = self.node_mut(node_id) else {
                continue;
            };
            tracing::trace!(
                node = ?node_id,
                title = %node.title,
                inputs = incoming.len(),
                "running node"
            );
            node.run(&incoming, arity).map_err(|source| RunError::Node {
                node: node_id,
                title: node.title.clone(),
                source,
            })?;
        }

        tracing::debug!(nodes = order.len(), "graph run complete");
        Ok(order)
    }

    /// Snapshot the source values feeding the given edges
    fn collect_inbound(&self, edges: &[EdgeId]) -> Vec<Inbound> {
        edges
            .iter()
            .filter_map(|id| self.edge(*id))
            .map(|edge| Inbound {
                edge: edge.id(),
                sink_port: edge.sink_port(),
                value: self
                    .node(edge.source_node())
                    .and_then(|n| n.port_by_id(edge.source_port()))
                    .and_then(Port::value)
                    .cloned(),
            })
            .collect()
    }
}

/// Error during a graph run
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Graph could not be ordered
    #[error(transparent)]
    Order(#[from] OrderError),

    /// An edge refers to a port its node no longer has, e.g. after the node
    /// was relinked in place
    #[error("Edge {edge:?} refers to missing port {port:?}")]
    DanglingEdge {
        /// Stale edge
        edge: EdgeId,
        /// Port that could not be resolved
        port: PortId,
    },

    /// A node failed
    #[error("Node {title:?} ({node:?}) failed: {source}")]
    Node {
        /// Failing node
        node: NodeId,
        /// Its display title
        title: String,
        /// Underlying failure
        #[source]
        source: CallError,
    },
}
