// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow graph engine for Rattler.
//!
//! Nodes wrap a callable with named input (sink) and output (source) ports.
//! Edges carry values from a source port to a sink port, and a [`Graph`] runs
//! every node exactly once in dependency order.
//!
//! ## Architecture
//!
//! - Ports hold values and know which node owns them
//! - Bindings pair a callable with its ports and act as reusable templates
//! - Nodes own a private copy of a binding
//! - The graph orders nodes with Kahn's algorithm and drives execution
//!
//! ```
//! use rattler_graph::{Arguments, Binding, Graph, Node, Port, PortType, PortValue};
//!
//! let add = Binding::new(
//!     |args: &Arguments| {
//!         let x = args.require("x")?.as_f64().unwrap_or_default();
//!         let y = args.require("y")?.as_f64().unwrap_or_default();
//!         Ok(vec![PortValue::Float(x + y)])
//!     },
//!     [
//!         Port::sink("x", PortType::Int).with_value(1),
//!         Port::sink("y", PortType::Float).with_value(2.0),
//!         Port::source("z", PortType::Float),
//!     ],
//! );
//!
//! let mut graph = Graph::new();
//! let a = graph.add_node(Node::with_binding("A", &add));
//! let b = graph.add_node(Node::with_binding("B", &add));
//! graph.connect(a, "z", b, "x")?;
//! graph.run()?;
//!
//! let z = graph.node(b).unwrap().port("z")?.value();
//! assert_eq!(z, Some(&PortValue::Float(5.0)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binding;
pub mod edge;
pub mod execution;
pub mod graph;
pub mod node;
pub mod port;
pub mod settings;

pub use binding::{Arguments, Binding, BoxError, CallError, Callable, MissingArgument};
pub use edge::{Edge, EdgeError, EdgeId, Inbound};
pub use execution::RunError;
pub use graph::{Graph, GraphError, OrderError};
pub use node::{Node, NodeId, PortLookupError};
pub use port::{Port, PortId, PortKind, PortType, PortValue};
pub use settings::{ArityPolicy, ExecutionSettings};
