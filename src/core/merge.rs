// core/merge.rs

// Connects trajectories to each other. Every vertex looks for the nearest
// sample on each other trajectory and gains an edge to it when that sample is
// strictly closer than the merge distance. The scan is the expensive part of a
// build, so it is split by vertex and run on the rayon pool; edges are applied
// afterwards in vertex order, which keeps neighbor lists identical to a
// sequential scan.

// Dependencies
use log::{debug, info};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::graph::{Graph, TrajectoryIndex, Vertex};
use super::trajectory::Sample;
use crate::{NavGraphError, Result};

/// Merge settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Samples must be strictly closer than this to be merged
    pub merge_dist: f32,
    /// Scan vertices on the rayon pool
    pub parallel: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        MergeConfig {
            merge_dist: 5.0,
            parallel: true,
        }
    }
}

/// Axis-aligned box around one trajectory's samples
#[derive(Debug, Clone, Copy)]
struct Bounds {
    min: Sample,
    max: Sample,
}

impl Bounds {
    fn of(vertices: &[Vertex]) -> Self {
        vertices.iter().fold(
            Bounds {
                min: Vector3::repeat(f32::INFINITY),
                max: Vector3::repeat(f32::NEG_INFINITY),
            },
            |b, v| Bounds {
                min: b.min.inf(&v.position),
                max: b.max.sup(&v.position),
            },
        )
    }

    // Lower bound on the distance from `point` to any sample inside the box.
    fn distance_to(&self, point: &Sample) -> f32 {
        let gap = (self.min - point)
            .sup(&(point - self.max))
            .sup(&Vector3::zeros());
        gap.norm()
    }
}

/// Adds cross-trajectory edges by proximity
pub struct GraphMerger {
    config: MergeConfig,
}

impl GraphMerger {
    /// Create a merger with the given settings
    pub fn new(config: &MergeConfig) -> Self {
        GraphMerger { config: *config }
    }

    /// Adds merge edges to `graph` and returns how many were added.
    /// No deduplication: the same pair may be connected once from each side.
    /// Fails without touching `graph` when `index` refers to vertices it
    /// does not have.
    pub fn merge(&self, graph: &mut Graph, index: &TrajectoryIndex) -> Result<usize> {
        if let Some(span) = index.spans().iter().find(|s| s.end > graph.vertex_count()) {
            return Err(NavGraphError::VertexOutOfRange {
                index: span.end - 1,
                count: graph.vertex_count(),
            });
        }

        let bounds: Vec<Bounds> = index
            .spans()
            .iter()
            .map(|span| Bounds::of(&graph.vertices()[span.clone()]))
            .collect();

        let shared: &Graph = graph;
        let targets: Vec<Vec<usize>> = if self.config.parallel {
            (0..shared.vertex_count())
                .into_par_iter()
                .map(|v| self.merge_targets(shared, index, &bounds, v))
                .collect()
        } else {
            (0..shared.vertex_count())
                .map(|v| self.merge_targets(shared, index, &bounds, v))
                .collect()
        };

        let mut added = 0;
        for (vertex, found) in targets.into_iter().enumerate() {
            for target in found {
                graph.connect(vertex, target);
                added += 1;
            }
        }

        info!("Edges added: {}", added);
        Ok(added)
    }

    /// Merge partners of one vertex, in trajectory order
    fn merge_targets(
        &self,
        graph: &Graph,
        index: &TrajectoryIndex,
        bounds: &[Bounds],
        vertex: usize,
    ) -> Vec<usize> {
        let v = &graph.vertices()[vertex];
        let mut found = Vec::new();

        for (ti, span) in index.spans().iter().enumerate() {
            if v.trajectory == Some(ti) {
                continue;
            }
            if bounds[ti].distance_to(&v.position) >= self.config.merge_dist {
                continue;
            }
            let Some((local, dist)) = nearest(&graph.vertices()[span.clone()], &v.position) else {
                continue;
            };
            if dist < self.config.merge_dist {
                debug!(
                    "Merging vertex {} with vertex {} of trajectory {} ({:.2})",
                    vertex,
                    span.start + local,
                    ti,
                    dist
                );
                found.push(span.start + local);
            }
        }

        found
    }
}

/// Stable argmin: the first of several equally near samples wins.
fn nearest(vertices: &[Vertex], point: &Sample) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in vertices.iter().enumerate() {
        let d = (v.position - point).norm();
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((i, d));
        }
    }
    best
}
