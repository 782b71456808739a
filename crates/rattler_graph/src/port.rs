// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::edge::Inbound;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PORT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(pub u64);

impl PortId {
    /// Allocate the next port ID
    pub fn new() -> Self {
        Self(NEXT_PORT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

/// Which side of a node a port sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Input port, pulls its value from an incoming edge
    Sink,
    /// Output port, written by the node's callable
    Source,
}

/// Declared data type of a port.
///
/// The tag is informational. Values flowing along edges are never checked
/// against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// String value
    String,
    /// List of values
    List,
    /// Any type (for generic nodes)
    Any,
    /// Custom type
    Custom(String),
}

/// Value that can be stored in a port
#[derive(Debug, Clone, PartialEq)]
pub enum PortValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
    /// List of values
    List(Vec<PortValue>),
}

impl PortValue {
    /// Get the port type this value would naturally be declared as
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Bool(_) => PortType::Bool,
            Self::Int(_) => PortType::Int,
            Self::Float(_) => PortType::Float,
            Self::String(_) => PortType::String,
            Self::List(_) => PortType::List,
        }
    }

    /// Read the value as an integer, truncating floats
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Read the value as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Read the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Borrow the value as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for PortValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PortValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for PortValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PortValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for PortValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// A named value slot on a node.
///
/// Identity, label and kind are fixed once the port exists. Linking a binding
/// to a node re-issues the ID.
#[derive(Debug, Clone)]
pub struct Port {
    id: PortId,
    label: String,
    kind: PortKind,
    /// Declared data type (advisory)
    pub data_type: PortType,
    /// Current value
    value: Option<PortValue>,
    /// Node this port was linked to, if any
    owner: Option<NodeId>,
}

impl Port {
    /// Create a new port
    pub fn new(label: impl Into<String>, data_type: PortType, kind: PortKind) -> Self {
        Self {
            id: PortId::new(),
            label: label.into(),
            kind,
            data_type,
            value: None,
            owner: None,
        }
    }

    /// Create a new input port
    pub fn sink(label: impl Into<String>, data_type: PortType) -> Self {
        Self::new(label, data_type, PortKind::Sink)
    }

    /// Create a new output port
    pub fn source(label: impl Into<String>, data_type: PortType) -> Self {
        Self::new(label, data_type, PortKind::Source)
    }

    /// Set the initial value
    pub fn with_value(mut self, value: impl Into<PortValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Port ID
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Port label, unique within its binding
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sink or source
    pub fn kind(&self) -> PortKind {
        self.kind
    }

    /// Whether this is an input port
    pub fn is_sink(&self) -> bool {
        self.kind == PortKind::Sink
    }

    /// Whether this is an output port
    pub fn is_source(&self) -> bool {
        self.kind == PortKind::Source
    }

    /// Current value, if any
    pub fn value(&self) -> Option<&PortValue> {
        self.value.as_ref()
    }

    /// Overwrite the current value from outside a run
    pub fn set_value(&mut self, value: Option<PortValue>) {
        self.value = value;
    }

    /// Node this port belongs to
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    pub(crate) fn attach(&mut self, node: NodeId) {
        self.id = PortId::new();
        self.owner = Some(node);
    }

    /// Refresh a sink from the edges terminating at its node.
    ///
    /// When several edges feed this port the last one in `incoming` wins.
    /// Without a matching edge the value is left untouched.
    pub fn update_from_edges(&mut self, incoming: &[Inbound]) {
        if !self.is_sink() {
            return;
        }
        for inbound in incoming.iter().filter(|i| i.sink_port == self.id) {
            self.value = inbound.value.clone();
        }
    }

    /// Store a value produced by the node's callable
    pub fn update(&mut self, value: PortValue) {
        self.value = Some(value);
    }
}
