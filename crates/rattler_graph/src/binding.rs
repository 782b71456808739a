// SPDX-License-Identifier: MIT OR Apache-2.0
//! Callable bindings: a function paired with its labelled ports.

use crate::edge::Inbound;
use crate::node::NodeId;
use crate::port::{Port, PortValue};
use crate::settings::ArityPolicy;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Error type user callables may fail with
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared, immutable node callable
pub type Callable = Arc<dyn Fn(&Arguments) -> Result<Vec<PortValue>, BoxError> + Send + Sync>;

/// Sink values handed to a callable, keyed by port label
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: IndexMap<String, Option<PortValue>>,
}

impl Arguments {
    /// Create an empty argument set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an argument
    pub fn insert(&mut self, label: impl Into<String>, value: Option<PortValue>) {
        self.values.insert(label.into(), value);
    }

    /// Get an argument value, `None` if the label is unknown or unset
    pub fn get(&self, label: &str) -> Option<&PortValue> {
        self.values.get(label).and_then(Option::as_ref)
    }

    /// Get an argument value or fail with [`MissingArgument`]
    pub fn require(&self, label: &str) -> Result<&PortValue, MissingArgument> {
        self.get(label).ok_or_else(|| MissingArgument(label.to_owned()))
    }

    /// Whether a label was passed at all
    pub fn contains(&self, label: &str) -> bool {
        self.values.contains_key(label)
    }

    /// Number of arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate arguments in declared order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&PortValue>)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// A callable together with the ports it reads and writes.
///
/// A binding is a template: [`Node::link`](crate::node::Node::link) clones it,
/// so one binding can back any number of nodes. The callable is shared between
/// clones, the ports are not.
#[derive(Clone)]
pub struct Binding {
    callable: Callable,
    ports: IndexMap<String, Port>,
}

impl Binding {
    /// Create a binding from a callable and its ports in declared order.
    ///
    /// A port reusing an earlier label replaces it.
    pub fn new<F>(callable: F, ports: impl IntoIterator<Item = Port>) -> Self
    where
        F: Fn(&Arguments) -> Result<Vec<PortValue>, BoxError> + Send + Sync + 'static,
    {
        Self::from_callable(Arc::new(callable), ports)
    }

    /// Create a binding around an already shared callable
    pub fn from_callable(callable: Callable, ports: impl IntoIterator<Item = Port>) -> Self {
        Self {
            callable,
            ports: ports.into_iter().map(|p| (p.label().to_owned(), p)).collect(),
        }
    }

    /// Get a port by label
    pub fn port(&self, label: &str) -> Option<&Port> {
        self.ports.get(label)
    }

    /// Overwrite the value of a port. Returns `false` if no port has `label`.
    pub fn set_value(&mut self, label: &str, value: Option<PortValue>) -> bool {
        match self.ports.get_mut(label) {
            Some(port) => {
                port.set_value(value);
                true
            }
            None => false,
        }
    }

    /// All ports in declared order
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    /// Input ports in declared order
    pub fn sinks(&self) -> impl Iterator<Item = &Port> {
        self.ports.values().filter(|p| p.is_sink())
    }

    /// Output ports in declared order
    pub fn sources(&self) -> impl Iterator<Item = &Port> {
        self.ports.values().filter(|p| p.is_source())
    }

    /// Number of ports
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub(crate) fn attach(&mut self, node: NodeId) {
        for port in self.ports.values_mut() {
            port.attach(node);
        }
    }

    /// Pull sink values from `incoming`, invoke the callable and store its
    /// results into the source ports.
    pub fn run(&mut self, incoming: &[Inbound], arity: ArityPolicy) -> Result<(), CallError> {
        let mut args = Arguments::new();
        for port in self.ports.values_mut().filter(|p| p.is_sink()) {
            port.update_from_edges(incoming);
            args.insert(port.label().to_owned(), port.value().cloned());
        }

        let results = (self.callable)(&args).map_err(CallError::Callable)?;

        let expected = self.sources().count();
        if results.len() != expected {
            match arity {
                ArityPolicy::Strict => {
                    return Err(CallError::ArityMismatch {
                        expected,
                        actual: results.len(),
                    });
                }
                ArityPolicy::Lenient => {
                    tracing::warn!(
                        expected,
                        actual = results.len(),
                        "callable result count does not match source ports"
                    );
                }
            }
        }

        let sources = self.ports.values_mut().filter(|p| p.is_source());
        for (port, value) in sources.zip(results) {
            port.update(value);
        }
        Ok(())
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("ports", &self.ports)
            .finish_non_exhaustive()
    }
}

/// A callable asked for an argument that has no value
#[derive(Debug, thiserror::Error)]
#[error("Missing argument: {0}")]
pub struct MissingArgument(pub String);

/// Error while running a node's binding
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    /// Node has no binding linked
    #[error("No binding linked to node {0:?}")]
    Unlinked(NodeId),

    /// The user callable failed
    #[error(transparent)]
    Callable(BoxError),

    /// Result count differs from the number of source ports
    #[error("Callable returned {actual} values for {expected} source ports")]
    ArityMismatch {
        /// Number of source ports
        expected: usize,
        /// Number of values returned
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::PortType;

    fn sum_binding() -> Binding {
        Binding::new(
            |args: &Arguments| {
                let x = args.require("x")?.as_f64().unwrap_or_default();
                let y = args.require("y")?.as_f64().unwrap_or_default();
                Ok(vec![PortValue::Float(x + y)])
            },
            [
                Port::sink("x", PortType::Int).with_value(1),
                Port::sink("y", PortType::Float).with_value(2.0),
                Port::source("z", PortType::Float),
            ],
        )
    }

    #[test]
    fn test_declared_order() {
        let binding = sum_binding();
        let labels: Vec<_> = binding.ports().map(|p| p.label()).collect();
        assert_eq!(labels, ["x", "y", "z"]);
        assert_eq!(binding.sinks().count(), 2);
        assert_eq!(binding.sources().count(), 1);
    }

    #[test]
    fn test_run_uses_defaults() {
        let mut binding = sum_binding();
        binding.run(&[], ArityPolicy::Strict).unwrap();
        assert_eq!(binding.port("z").unwrap().value(), Some(&PortValue::Float(3.0)));
    }

    #[test]
    fn test_set_value_on_template() {
        let mut binding = sum_binding();
        assert!(binding.set_value("y", Some(PortValue::Int(10))));
        assert!(!binding.set_value("w", None));
        binding.run(&[], ArityPolicy::Strict).unwrap();
        assert_eq!(binding.port("z").unwrap().value(), Some(&PortValue::Float(11.0)));
    }

    #[test]
    fn test_missing_argument_propagates() {
        let mut binding = Binding::new(
            |args: &Arguments| Ok(vec![args.require("x")?.clone()]),
            [Port::sink("x", PortType::Int), Port::source("y", PortType::Int)],
        );
        let err = binding.run(&[], ArityPolicy::Strict).unwrap_err();
        assert!(matches!(err, CallError::Callable(_)));
        assert_eq!(err.to_string(), "Missing argument: x");
        assert!(binding.port("y").unwrap().value().is_none());
    }

    #[test]
    fn test_strict_arity_rejects_short_result() {
        let mut binding = Binding::new(
            |_: &Arguments| Ok(vec![PortValue::Int(1)]),
            [Port::source("a", PortType::Int), Port::source("b", PortType::Int)],
        );
        let err = binding.run(&[], ArityPolicy::Strict).unwrap_err();
        assert!(matches!(err, CallError::ArityMismatch { expected: 2, actual: 1 }));
        assert!(binding.port("a").unwrap().value().is_none());
    }

    #[test]
    fn test_lenient_arity() {
        let mut short = Binding::new(
            |_: &Arguments| Ok(vec![PortValue::Int(1)]),
            [Port::source("a", PortType::Int), Port::source("b", PortType::Int)],
        );
        short.run(&[], ArityPolicy::Lenient).unwrap();
        assert_eq!(short.port("a").unwrap().value(), Some(&PortValue::Int(1)));
        assert!(short.port("b").unwrap().value().is_none());

        let mut long = Binding::new(
            |_: &Arguments| Ok(vec![PortValue::Int(1), PortValue::Int(2)]),
            [Port::source("a", PortType::Int)],
        );
        long.run(&[], ArityPolicy::Lenient).unwrap();
        assert_eq!(long.port("a").unwrap().value(), Some(&PortValue::Int(1)));
    }

    #[test]
    fn test_duplicate_label_replaces() {
        let binding = Binding::new(
            |_: &Arguments| Ok(Vec::new()),
            [Port::sink("x", PortType::Int), Port::sink("x", PortType::Float)],
        );
        assert_eq!(binding.port_count(), 1);
        assert_eq!(binding.port("x").unwrap().data_type, PortType::Float);
    }
}
