//! Flow definitions: the static directed graphs the simulator animates.
//!
//! A flow is an ordered set of stages plus transitions, built through the
//! fluent [`FlowBuilder`] and validated at build time. Validation is strict
//! by design: a malformed flow is a programmer error and fails fast with a
//! [`FlowError`] diagnostic rather than silently rendering an empty graph.
//!
//! The two shipped pipeline topologies live in [`variants`].

mod builder;
mod graph;
pub mod variants;

pub use builder::{FlowBuilder, FlowError};
pub use graph::{FlowEdge, FlowGraph, FlowNode, Position};
pub use variants::graph_for;
