//! Navigation queries for navgraph
//!
//! This module answers shortest-path queries over a built navigation graph,
//! either between vertex indices or between arbitrary points snapped to
//! their closest vertices.

pub mod planner;

pub use planner::{Path, PathFinder};
