//! Trajectory processing and graph construction
//!
//! Everything that happens before a navigation graph is ready for export:
//! - Splitting the raw sample stream into trajectories
//! - Simplifying each trajectory
//! - Building the per-trajectory vertex chains
//! - Merging trajectories by proximity

pub mod graph;
pub mod merge;
pub mod simplify;
pub mod trajectory;

pub use graph::{BuiltGraph, Graph, GraphBuilder, TrajectoryIndex, Vertex};
pub use merge::{GraphMerger, MergeConfig};
pub use simplify::{SimplifyConfig, TrajectorySimplifier};
pub use trajectory::{
    LoaderConfig, RawSampleFile, Sample, SampleSource, Trajectory, TrajectoryLoader,
    is_sentinel, samples_from_flat, samples_from_le_bytes,
};
