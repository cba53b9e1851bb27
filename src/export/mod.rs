//! Binary export for navgraph
//!
//! This module handles the navigation graph file shared with the viewer:
//! - Writing the graph with an atomic replace of the destination
//! - Reading it back with a strict forward scan

mod reader;
mod writer;

pub use reader::GraphReader;
pub use writer::GraphSerializer;
