// core/graph.rs

// The navigation graph: one vertex per simplified sample, undirected edges kept
// as neighbor lists on both endpoints. Vertex indices are handed out once, in
// insertion order, and are also the indices written to the export file.

// Dependencies
use log::info;
use std::ops::Range;

use super::trajectory::{Sample, Trajectory};
use crate::{NavGraphError, Result};

/// Graph node: a position, the trajectory it came from and its neighbors
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Position in the recording frame
    pub position: Sample,
    /// Originating trajectory; `None` for vertices decoded from an export file
    pub trajectory: Option<usize>,
    /// Neighbor vertex indices, one entry per edge (duplicates allowed)
    pub neighbors: Vec<usize>,
}

impl Vertex {
    fn new(position: Sample, trajectory: Option<usize>) -> Self {
        Vertex {
            position,
            trajectory,
            neighbors: Vec::new(),
        }
    }
}

/// Ordered collection of vertices with undirected edges
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    vertices: Vec<Vertex>,
}

impl Graph {
    /// Empty graph
    pub fn new() -> Self {
        Graph::default()
    }

    /// Appends a vertex and returns its permanent index
    pub fn add_vertex(&mut self, position: Sample, trajectory: Option<usize>) -> usize {
        self.vertices.push(Vertex::new(position, trajectory));
        self.vertices.len() - 1
    }

    /// Adds the undirected edge `a`-`b`
    pub fn add_edge(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        self.connect(a, b);
        Ok(())
    }

    // Caller guarantees both indices are in range.
    pub(crate) fn connect(&mut self, a: usize, b: usize) {
        self.vertices[a].neighbors.push(b);
        self.vertices[b].neighbors.push(a);
    }

    // One side of an edge only, for decoders that read both sides separately.
    pub(crate) fn push_neighbor(&mut self, a: usize, b: usize) {
        self.vertices[a].neighbors.push(b);
    }

    /// Vertex by index
    pub fn vertex(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    /// All vertices in index order
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// True when the graph has no vertices
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of undirected edges, duplicates included
    pub fn edge_count(&self) -> usize {
        self.vertices.iter().map(|v| v.neighbors.len()).sum::<usize>() / 2
    }

    /// Every undirected edge once as `(a, b)` with `a < b`
    pub fn line_indices(&self) -> Vec<(usize, usize)> {
        self.vertices
            .iter()
            .enumerate()
            .flat_map(|(a, v)| {
                v.neighbors
                    .iter()
                    .filter(move |&&b| a < b)
                    .map(move |&b| (a, b))
            })
            .collect()
    }

    /// Index of the vertex closest to `point` on the ground plane (x, y).
    /// The first of several equally close vertices wins.
    pub fn closest_vertex(&self, point: &Sample) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, v) in self.vertices.iter().enumerate() {
            let d = (v.position.xy() - point.xy()).norm();
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    /// True when every edge is recorded on both of its endpoints, as many
    /// times on one side as on the other
    pub fn is_symmetric(&self) -> bool {
        let count = |list: &[usize], x: usize| list.iter().filter(|&&n| n == x).count();
        self.vertices.iter().enumerate().all(|(a, v)| {
            v.neighbors.iter().all(|&b| {
                self.vertices
                    .get(b)
                    .is_some_and(|other| count(&v.neighbors, b) == count(&other.neighbors, a))
            })
        })
    }

    pub(crate) fn check_index(&self, index: usize) -> Result<()> {
        if index < self.vertices.len() {
            Ok(())
        } else {
            Err(NavGraphError::VertexOutOfRange {
                index,
                count: self.vertices.len(),
            })
        }
    }
}

/// Per-trajectory mapping from local sample index to global vertex index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectoryIndex {
    spans: Vec<Range<usize>>,
}

impl TrajectoryIndex {
    /// Number of trajectories
    pub fn trajectory_count(&self) -> usize {
        self.spans.len()
    }

    /// Global vertex index of sample `local` of `trajectory`
    pub fn vertex(&self, trajectory: usize, local: usize) -> Option<usize> {
        let span = self.spans.get(trajectory)?;
        let global = span.start + local;
        (global < span.end).then_some(global)
    }

    /// Vertex indices owned by `trajectory`
    pub fn span(&self, trajectory: usize) -> Option<Range<usize>> {
        self.spans.get(trajectory).cloned()
    }

    /// Vertex ranges of all trajectories, in trajectory order
    pub fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }
}

/// Builder output: the unmerged graph plus its trajectory index
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuiltGraph {
    /// Graph with intra-trajectory edges only
    pub graph: Graph,
    /// Where each trajectory's vertices live
    pub index: TrajectoryIndex,
}

/// Turns simplified trajectories into a chain-per-trajectory graph
pub struct GraphBuilder;

impl GraphBuilder {
    /// Consumes the trajectories. Any trajectory with fewer than two points is
    /// rejected before a single vertex is created.
    pub fn build(trajectories: Vec<Trajectory>) -> Result<BuiltGraph> {
        if let Some((i, t)) = trajectories.iter().enumerate().find(|(_, t)| t.len() < 2) {
            return Err(NavGraphError::MalformedInput(format!(
                "trajectory {} has {} point(s) after simplification, need at least 2",
                i,
                t.len()
            )));
        }

        let total = trajectories.iter().map(Trajectory::len).sum();
        let mut graph = Graph {
            vertices: Vec::with_capacity(total),
        };
        let mut spans = Vec::with_capacity(trajectories.len());

        for (ti, trajectory) in trajectories.into_iter().enumerate() {
            let start = graph.vertex_count();
            for point in trajectory.into_points() {
                let vi = graph.add_vertex(point, Some(ti));
                if vi != start {
                    graph.connect(vi, vi - 1);
                }
            }
            spans.push(start..graph.vertex_count());
        }

        info!(
            "Built graph: {} vertices, {} trajectory edges",
            graph.vertex_count(),
            graph.edge_count()
        );

        Ok(BuiltGraph {
            graph,
            index: TrajectoryIndex { spans },
        })
    }
}
