// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::binding::{Binding, CallError};
use crate::edge::Inbound;
use crate::port::{Port, PortId, PortValue};
use crate::settings::ArityPolicy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Allocate the next node ID
    pub fn new() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&Node> for NodeId {
    fn from(node: &Node) -> Self {
        node.id
    }
}

/// A node instance in the graph
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    /// Display name, not required to be unique
    pub title: String,
    /// Private copy of the linked binding
    binding: Option<Binding>,
}

impl Node {
    /// Create a node without a binding
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(),
            title: title.into(),
            binding: None,
        }
    }

    /// Create a node and link `binding` to it
    pub fn with_binding(title: impl Into<String>, binding: &Binding) -> Self {
        let mut node = Self::new(title);
        node.link(binding);
        node
    }

    /// Link a copy of `binding` to this node.
    ///
    /// The copied ports get fresh IDs and are owned by this node, so the
    /// template and other nodes linked from it are never affected. Any
    /// previously linked binding is replaced.
    pub fn link(&mut self, binding: &Binding) {
        let mut binding = binding.clone();
        binding.attach(self.id);
        self.binding = Some(binding);
    }

    /// Unique instance ID
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether a binding is linked
    pub fn is_linked(&self) -> bool {
        self.binding.is_some()
    }

    /// The linked binding
    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    /// Get a port by label
    pub fn port(&self, label: &str) -> Result<&Port, PortLookupError> {
        let binding = self.binding.as_ref().ok_or(PortLookupError::Unlinked(self.id))?;
        binding.port(label).ok_or_else(|| PortLookupError::UnknownPort {
            node: self.id,
            label: label.to_owned(),
        })
    }

    /// Overwrite the value of a port, e.g. to seed a sink default
    pub fn set_value(
        &mut self,
        label: &str,
        value: Option<PortValue>,
    ) -> Result<(), PortLookupError> {
        let id = self.id;
        let binding = self.binding.as_mut().ok_or(PortLookupError::Unlinked(id))?;
        if binding.set_value(label, value) {
            Ok(())
        } else {
            Err(PortLookupError::UnknownPort {
                node: id,
                label: label.to_owned(),
            })
        }
    }

    /// Get a port by ID
    pub fn port_by_id(&self, port_id: PortId) -> Option<&Port> {
        self.ports().find(|p| p.id() == port_id)
    }

    /// Get all ports
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.binding.iter().flat_map(Binding::ports)
    }

    /// Execute the linked binding with the edges terminating at this node
    pub fn run(&mut self, incoming: &[Inbound], arity: ArityPolicy) -> Result<(), CallError> {
        let binding = self.binding.as_mut().ok_or(CallError::Unlinked(self.id))?;
        binding.run(incoming, arity)
    }
}

/// Error when looking up a port on a node
#[derive(Debug, thiserror::Error)]
pub enum PortLookupError {
    /// Node has no binding yet
    #[error("Node {0:?} has no binding linked")]
    Unlinked(NodeId),

    /// No port with that label
    #[error("Node {node:?} has no port labelled {label:?}")]
    UnknownPort {
        /// Node that was searched
        node: NodeId,
        /// Requested label
        label: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Arguments;
    use crate::port::{PortKind, PortType};

    fn passthrough() -> Binding {
        Binding::new(
            |args: &Arguments| Ok(vec![args.require("in")?.clone()]),
            [
                Port::sink("in", PortType::Any).with_value(1),
                Port::source("out", PortType::Any),
            ],
        )
    }

    #[test]
    fn test_link_sets_owner() {
        let node = Node::with_binding("N", &passthrough());
        assert!(node.is_linked());
        assert!(node.ports().all(|p| p.owner() == Some(node.id())));

        let out = node.port("out").unwrap().id();
        assert_eq!(node.port_by_id(out).map(Port::label), Some("out"));
        assert!(node.port_by_id(PortId::new()).is_none());
    }

    #[test]
    fn test_link_isolates_nodes() {
        let template = passthrough();
        let mut a = Node::with_binding("A", &template);
        let b = Node::with_binding("B", &template);

        assert_ne!(a.port("in").unwrap().id(), b.port("in").unwrap().id());

        a.set_value("in", Some(PortValue::Int(99))).unwrap();
        a.run(&[], ArityPolicy::Strict).unwrap();

        assert_eq!(a.port("out").unwrap().value(), Some(&PortValue::Int(99)));
        assert_eq!(b.port("in").unwrap().value(), Some(&PortValue::Int(1)));
        assert!(b.port("out").unwrap().value().is_none());
        assert_eq!(template.port("in").unwrap().value(), Some(&PortValue::Int(1)));
        assert!(template.port("in").unwrap().owner().is_none());
    }

    #[test]
    fn test_port_lookup_errors() {
        let mut node = Node::new("Empty");
        assert!(matches!(node.port("x"), Err(PortLookupError::Unlinked(_))));
        assert!(matches!(
            node.run(&[], ArityPolicy::Strict),
            Err(CallError::Unlinked(id)) if id == node.id()
        ));

        node.link(&passthrough());
        assert!(matches!(
            node.port("missing"),
            Err(PortLookupError::UnknownPort { ref label, .. }) if label == "missing"
        ));
    }

    #[test]
    fn test_set_value_keeps_port_identity() {
        let mut node = Node::with_binding("N", &passthrough());
        let before = node.port("in").unwrap().id();

        node.set_value("in", Some(PortValue::Int(5))).unwrap();
        let port = node.port("in").unwrap();
        assert_eq!(port.label(), "in");
        assert_eq!(port.kind(), PortKind::Sink);
        assert_eq!(port.id(), before);
        assert_eq!(port.value(), Some(&PortValue::Int(5)));

        assert!(matches!(
            node.set_value("zzz", None),
            Err(PortLookupError::UnknownPort { .. })
        ));
        assert!(matches!(
            Node::new("Bare").set_value("in", None),
            Err(PortLookupError::Unlinked(_))
        ));
    }

    #[test]
    fn test_relink_replaces_ports() {
        let mut node = Node::with_binding("N", &passthrough());
        let first = node.port("in").unwrap().id();
        node.link(&passthrough());
        assert_ne!(node.port("in").unwrap().id(), first);
    }
}
