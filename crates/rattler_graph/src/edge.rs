// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edge definitions for the graph.

use crate::node::NodeId;
use crate::port::{Port, PortId, PortValue};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_EDGE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl EdgeId {
    /// Allocate the next edge ID
    pub fn new() -> Self {
        Self(NEXT_EDGE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Edge> for EdgeId {
    fn from(edge: &Edge) -> Self {
        edge.id
    }
}

/// A directed connection from a source port to a sink port.
///
/// Endpoints are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    id: EdgeId,
    source_port: PortId,
    sink_port: PortId,
    source_node: NodeId,
    sink_node: NodeId,
}

impl Edge {
    /// Connect `source` to `sink`. Both ports must belong to linked nodes.
    pub fn new(source: &Port, sink: &Port) -> Result<Self, EdgeError> {
        if !source.is_source() {
            return Err(EdgeError::NotASource(source.label().to_owned()));
        }
        if !sink.is_sink() {
            return Err(EdgeError::NotASink(sink.label().to_owned()));
        }
        let source_node = source.owner().ok_or(EdgeError::Unowned(source.id()))?;
        let sink_node = sink.owner().ok_or(EdgeError::Unowned(sink.id()))?;

        Ok(Self {
            id: EdgeId::new(),
            source_port: source.id(),
            sink_port: sink.id(),
            source_node,
            sink_node,
        })
    }

    /// Edge ID
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Output port the value comes from
    pub fn source_port(&self) -> PortId {
        self.source_port
    }

    /// Input port the value goes to
    pub fn sink_port(&self) -> PortId {
        self.sink_port
    }

    /// Node owning the source port
    pub fn source_node(&self) -> NodeId {
        self.source_node
    }

    /// Node owning the sink port
    pub fn sink_node(&self) -> NodeId {
        self.sink_node
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.source_node == node_id || self.sink_node == node_id
    }

    /// Check if this edge involves a specific port
    pub fn involves_port(&self, port_id: PortId) -> bool {
        self.source_port == port_id || self.sink_port == port_id
    }
}

/// An edge terminating at the running node, carrying the value its source
/// port held when the node started.
#[derive(Debug, Clone, PartialEq)]
pub struct Inbound {
    /// Edge this value travelled along
    pub edge: EdgeId,
    /// Sink port to write
    pub sink_port: PortId,
    /// Source port value
    pub value: Option<PortValue>,
}

/// Error when constructing an edge
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// Start of the edge is not an output port
    #[error("Port {0:?} is not a source")]
    NotASource(String),

    /// End of the edge is not an input port
    #[error("Port {0:?} is not a sink")]
    NotASink(String),

    /// Port was never linked to a node
    #[error("Port {0:?} is not owned by a node")]
    Unowned(PortId),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Arguments, Binding};
    use crate::node::Node;
    use crate::port::PortType;

    fn identity() -> Binding {
        Binding::new(
            |args: &Arguments| Ok(args.get("in").cloned().into_iter().collect()),
            [Port::sink("in", PortType::Any), Port::source("out", PortType::Any)],
        )
    }

    #[test]
    fn test_edge_derives_nodes() {
        let a = Node::with_binding("A", &identity());
        let b = Node::with_binding("B", &identity());
        let edge = Edge::new(a.port("out").unwrap(), b.port("in").unwrap()).unwrap();

        assert_eq!(edge.source_node(), a.id());
        assert_eq!(edge.sink_node(), b.id());
        assert_eq!(edge.source_port(), a.port("out").unwrap().id());
        assert!(edge.involves_node(a.id()));
        assert!(edge.involves_port(b.port("in").unwrap().id()));
        assert!(!edge.involves_port(a.port("in").unwrap().id()));
    }

    #[test]
    fn test_edge_direction_checked() {
        let a = Node::with_binding("A", &identity());
        let b = Node::with_binding("B", &identity());
        assert!(matches!(
            Edge::new(a.port("in").unwrap(), b.port("in").unwrap()),
            Err(EdgeError::NotASource(_))
        ));
        assert!(matches!(
            Edge::new(a.port("out").unwrap(), b.port("out").unwrap()),
            Err(EdgeError::NotASink(_))
        ));
    }

    #[test]
    fn test_unlinked_port_rejected() {
        let template = identity();
        let b = Node::with_binding("B", &template);
        let err = Edge::new(template.port("out").unwrap(), b.port("in").unwrap()).unwrap_err();
        assert!(matches!(err, EdgeError::Unowned(_)));
    }
}
