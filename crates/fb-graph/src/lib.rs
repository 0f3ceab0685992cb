//! fb-graph: block graph layer for fbflow.
//!
//! Provides:
//! - Blocks, typed directional ports and links
//! - Link validation (direction, signal type, self-links, occupancy)
//! - Structural queries used by the scheduler
//!
//! # Example
//!
//! ```
//! use fb_core::SignalType;
//! use fb_graph::{BlockGraph, PortDirection};
//!
//! let mut graph = BlockGraph::new();
//! let tx = graph.add_block("Transmitter", "source").unwrap();
//! let rx = graph.add_block("Receiver", "probe").unwrap();
//! let out = graph.add_port(tx, "out", PortDirection::Out, SignalType::Electrical).unwrap();
//! let inp = graph.add_port(rx, "in", PortDirection::In, SignalType::Electrical).unwrap();
//! graph.add_link(out, inp).unwrap();
//!
//! assert_eq!(graph.blocks().len(), 2);
//! assert!(graph.port(inp).unwrap().connected);
//! ```

pub mod error;
pub mod graph;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use error::{GraphError, GraphResult};
pub use graph::{Block, BlockGraph, Link, Port, PortDirection, PortRef};
