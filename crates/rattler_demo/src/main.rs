// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rattler demo: two adder nodes feeding a third.
//!
//! A1 and A2 each add their default inputs (1 + 2) and feed B1, which adds
//! the two results. An optional first argument names a RON execution
//! settings file.

use rattler_graph::{Arguments, Binding, ExecutionSettings, Graph, Node, Port, PortType, PortValue};
use std::error::Error;
use std::path::Path;

fn add_xy() -> Binding {
    Binding::new(
        |args: &Arguments| {
            let x = args.require("x")?.as_f64().ok_or("x must be numeric")?;
            let y = args.require("y")?.as_f64().ok_or("y must be numeric")?;
            Ok(vec![PortValue::Float(x + y)])
        },
        [
            Port::sink("x", PortType::Int).with_value(1),
            Port::sink("y", PortType::Float).with_value(2.0),
            Port::source("z", PortType::Float),
        ],
    )
}

fn log_node(graph: &Graph, node: &Node) {
    for port in node.ports() {
        tracing::info!(
            title = %node.title,
            port = %port.label(),
            kind = ?port.kind(),
            value = ?port.value(),
            incoming = graph.edges().filter(|e| e.sink_port() == port.id()).count(),
        );
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let settings = match std::env::args().nth(1) {
        Some(path) => ExecutionSettings::load(Path::new(&path))?,
        None => ExecutionSettings::default(),
    };

    let function = add_xy();
    let mut graph = Graph::with_settings(settings);
    let a1 = graph.add_node(Node::with_binding("A1", &function));
    let a2 = graph.add_node(Node::with_binding("A2", &function));
    let b1 = graph.add_node(Node::with_binding("B1", &function));

    graph.connect(a1, "z", b1, "x")?;
    graph.connect(a2, "z", b1, "y")?;

    let order = graph.run()?;
    tracing::info!("Executed {} nodes", order.len());

    for node in graph.nodes() {
        log_node(&graph, node);
    }
    Ok(())
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,rattler_graph=debug"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!("Starting Rattler demo v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run() {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}
