//! Navgraph - navigation graphs from recorded trajectories
//!
//! This library turns a set of recorded 3D trajectories into a connected
//! navigation graph, writes it in the compact binary format read by the
//! viewer and answers shortest-path queries over it.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod core;
pub mod export;
pub mod navigation;

// Re-export commonly used items for easier access
pub use self::core::{
    BuiltGraph, Graph, GraphBuilder, GraphMerger, LoaderConfig, MergeConfig, RawSampleFile,
    Sample, SampleSource, SimplifyConfig, Trajectory, TrajectoryIndex, TrajectoryLoader,
    TrajectorySimplifier, Vertex,
};
pub use export::{GraphReader, GraphSerializer};
pub use navigation::{Path, PathFinder};

use log::info;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration structure for a navgraph build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavGraphConfig {
    /// Trajectory splitting
    pub loader: LoaderConfig,
    /// Simplification thresholds
    pub simplify: SimplifyConfig,
    /// Cross-trajectory merging
    pub merge: MergeConfig,
    /// Input and output locations used by the binary
    pub io: IoConfig,
}

/// File locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IoConfig {
    /// Raw little-endian `f32` sample file
    pub samples: PathBuf,
    /// Destination of the exported graph
    pub output: PathBuf,
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            samples: PathBuf::from("trajectories.bin"),
            output: PathBuf::from("navigation_graph.bytes"),
        }
    }
}

impl NavGraphConfig {
    /// Loads a YAML configuration file; missing keys take their defaults
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| NavGraphError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: NavGraphConfig = serde_yaml::from_str(&text)
            .map_err(|e| NavGraphError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Rejects thresholds no build could use
    pub fn validate(&self) -> Result<()> {
        if !self.simplify.desired_dist.is_finite() || self.simplify.desired_dist < 0.0 {
            return Err(NavGraphError::Config(format!(
                "simplify.desired_dist must be a finite, non-negative distance, got {}",
                self.simplify.desired_dist
            )));
        }
        if self.simplify.optimize_tangent.is_nan() {
            return Err(NavGraphError::Config(
                "simplify.optimize_tangent must be a number".to_string(),
            ));
        }
        if !self.merge.merge_dist.is_finite() || self.merge.merge_dist < 0.0 {
            return Err(NavGraphError::Config(format!(
                "merge.merge_dist must be a finite, non-negative distance, got {}",
                self.merge.merge_dist
            )));
        }
        Ok(())
    }
}

/// Counts gathered while a pipeline runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Trajectories produced by the loader
    pub trajectories: usize,
    /// Samples before simplification
    pub samples_before: usize,
    /// Samples after simplification
    pub samples_after: usize,
    /// Vertices in the built graph
    pub vertices: usize,
    /// Edges along trajectories
    pub trajectory_edges: usize,
    /// Edges added by merging
    pub merge_edges: usize,
}

/// Explicit build pipeline: load, simplify, build, merge, then serialize or query
pub struct NavGraphPipeline {
    config: NavGraphConfig,
    loader: TrajectoryLoader,
    simplifier: TrajectorySimplifier,
    merger: GraphMerger,
    report: BuildReport,
}

impl NavGraphPipeline {
    /// Create a pipeline; fails on an unusable configuration
    pub fn new(config: NavGraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(NavGraphPipeline {
            loader: TrajectoryLoader::new(&config.loader),
            simplifier: TrajectorySimplifier::new(&config.simplify),
            merger: GraphMerger::new(&config.merge),
            config,
            report: BuildReport::default(),
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &NavGraphConfig {
        &self.config
    }

    /// Counts from the stages run so far
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Stage 1: pull samples from `source` and split them into trajectories
    pub fn load<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<Vec<Trajectory>> {
        let trajectories = self.loader.load(source)?;
        self.report.trajectories = trajectories.len();
        self.report.samples_before = trajectories.iter().map(Trajectory::len).sum();
        Ok(trajectories)
    }

    /// Stage 2: simplify every trajectory
    pub fn simplify(&mut self, trajectories: Vec<Trajectory>) -> Vec<Trajectory> {
        let simplified = self.simplifier.simplify_all(trajectories);
        self.report.samples_after = simplified.iter().map(Trajectory::len).sum();
        simplified
    }

    /// Stage 3: build the unmerged graph
    pub fn build(&mut self, trajectories: Vec<Trajectory>) -> Result<BuiltGraph> {
        let built = GraphBuilder::build(trajectories)?;
        self.report.vertices = built.graph.vertex_count();
        self.report.trajectory_edges = built.graph.edge_count();
        Ok(built)
    }

    /// Stage 4: add merge edges; the trajectory index is dropped afterwards
    pub fn merge(&mut self, built: BuiltGraph) -> Result<Graph> {
        let BuiltGraph { mut graph, index } = built;
        self.report.merge_edges = self.merger.merge(&mut graph, &index)?;
        Ok(graph)
    }

    /// Runs stages 1 to 4
    pub fn run<S: SampleSource + ?Sized>(&mut self, source: &S) -> Result<Graph> {
        let trajectories = self.load(source)?;
        let simplified = self.simplify(trajectories);
        let built = self.build(simplified)?;
        let graph = self.merge(built)?;
        info!(
            "Navigation graph ready: {} vertices, {} edges",
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Writes `graph` to `path` atomically
    pub fn serialize(&self, graph: &Graph, path: impl AsRef<std::path::Path>) -> Result<()> {
        GraphSerializer::new(graph).save(path)
    }

    /// Shortest path between two vertices; `Ok(None)` when unreachable
    pub fn query(&self, graph: &Graph, source: usize, target: usize) -> Result<Option<Path>> {
        PathFinder::new(graph).find_path(source, target)
    }
}

/// Navgraph error types
#[derive(Debug, Error)]
pub enum NavGraphError {
    /// Sample stream or trajectories unusable for a build
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// A vertex index beyond the end of the graph
    #[error("vertex {index} out of range (graph has {count} vertices)")]
    VertexOutOfRange {
        /// Offending index
        index: usize,
        /// Number of vertices in the graph
        count: usize,
    },
    /// The graph could not be written to its destination
    #[error("failed to write navigation graph to {}: {source}", path.display())]
    Serialization {
        /// Destination that was being written
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
    /// The graph does not fit the export format
    #[error("graph cannot be exported: {0}")]
    ExportOverflow(String),
    /// An exported graph could not be decoded
    #[error("malformed navigation graph: {0}")]
    MalformedGraph(String),
    /// An input file could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
    /// Stream I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across navgraph
pub type Result<T> = std::result::Result<T, NavGraphError>;
