// src/navigation/planner.rs
// Shortest-path queries over a finished navigation graph.

// Dijkstra with a binary-heap frontier. Edge weights are the Euclidean
// distance between endpoint positions, computed when an edge is relaxed.
// All search state lives in per-query arrays indexed by vertex and is
// dropped when the query returns.

use log::debug;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::core::{Graph, Sample};
use crate::Result;

/// A vertex path, source to target inclusive
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    vertices: Vec<usize>,
    length: f32,
}

impl Path {
    /// Vertex indices from source to target
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Sum of edge lengths along the path
    pub fn length(&self) -> f32 {
        self.length
    }

    /// First vertex
    pub fn source(&self) -> usize {
        self.vertices[0]
    }

    /// Last vertex
    pub fn target(&self) -> usize {
        self.vertices[self.vertices.len() - 1]
    }

    /// Number of vertices on the path
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always false; a path holds at least its source
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Consecutive vertex pairs
    pub fn segments(&self) -> Vec<(usize, usize)> {
        self.vertices.windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// Positions of the path vertices in `graph`
    pub fn positions(&self, graph: &Graph) -> Vec<Sample> {
        self.vertices
            .iter()
            .filter_map(|&i| graph.vertex(i).map(|v| v.position))
            .collect()
    }
}

// Min-heap entry: smallest distance first, lower vertex index on ties.
#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    distance: f32,
    vertex: usize,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

/// Shortest-path search over a borrowed graph
pub struct PathFinder<'g> {
    graph: &'g Graph,
}

impl<'g> PathFinder<'g> {
    /// Create a path finder for `graph`
    pub fn new(graph: &'g Graph) -> Self {
        PathFinder { graph }
    }

    /// Shortest path from `source` to `target`.
    ///
    /// Returns `Ok(None)` when the target cannot be reached and an error only
    /// when an index is out of range. `source == target` yields a one-vertex
    /// path of length zero.
    pub fn find_path(&self, source: usize, target: usize) -> Result<Option<Path>> {
        self.graph.check_index(source)?;
        self.graph.check_index(target)?;
        Ok(self.search(source, target))
    }

    /// Snaps both points to their closest vertices on the ground plane and
    /// searches between them.
    pub fn plan_between(&self, from: &Sample, to: &Sample) -> Option<Path> {
        let source = self.graph.closest_vertex(from)?;
        let target = self.graph.closest_vertex(to)?;
        self.search(source, target)
    }

    fn search(&self, source: usize, target: usize) -> Option<Path> {
        let vertices = self.graph.vertices();
        let mut best: Vec<Option<f32>> = vec![None; vertices.len()];
        let mut previous: Vec<Option<usize>> = vec![None; vertices.len()];
        let mut settled = vec![false; vertices.len()];
        let mut frontier = BinaryHeap::new();

        best[source] = Some(0.0);
        frontier.push(FrontierEntry {
            distance: 0.0,
            vertex: source,
        });

        while let Some(FrontierEntry { distance, vertex }) = frontier.pop() {
            if settled[vertex] {
                continue;
            }
            settled[vertex] = true;

            if vertex == target {
                let path = reconstruct(&previous, target, distance);
                debug!(
                    "Path {} -> {}: {} vertices, length {:.2}",
                    source,
                    target,
                    path.len(),
                    path.length()
                );
                return Some(path);
            }

            let here = vertices[vertex].position;
            for &next in &vertices[vertex].neighbors {
                if settled[next] {
                    continue;
                }
                let candidate = distance + (vertices[next].position - here).norm();
                if best[next].is_some_and(|current| candidate >= current) {
                    continue;
                }
                best[next] = Some(candidate);
                previous[next] = Some(vertex);
                frontier.push(FrontierEntry {
                    distance: candidate,
                    vertex: next,
                });
            }
        }

        debug!("No path {} -> {}", source, target);
        None
    }
}

fn reconstruct(previous: &[Option<usize>], target: usize, length: f32) -> Path {
    let mut vertices = vec![target];
    let mut cursor = target;
    while let Some(prev) = previous[cursor] {
        vertices.push(prev);
        cursor = prev;
    }
    vertices.reverse();
    Path { vertices, length }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NavGraphError;

    // 0 - 1 - 2 - 3 along x, plus a detour 0 - 4 - 3 high above the line
    fn diamond() -> Graph {
        let mut g = Graph::new();
        for x in [0.0, 1.0, 2.0, 3.0] {
            g.add_vertex(Sample::new(x, 0.0, 0.0), Some(0));
        }
        g.add_vertex(Sample::new(1.5, 10.0, 0.0), Some(1));
        g.add_edge(0, 1).unwrap();
        g.add_edge(1, 2).unwrap();
        g.add_edge(2, 3).unwrap();
        g.add_edge(0, 4).unwrap();
        g.add_edge(4, 3).unwrap();
        g
    }

    #[test]
    fn finds_shortest_route() {
        let g = diamond();
        let path = PathFinder::new(&g).find_path(0, 3).unwrap().unwrap();
        assert_eq!(path.vertices(), &[0, 1, 2, 3]);
        assert!((path.length() - 3.0).abs() < 1e-6);
        assert_eq!(path.segments(), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn takes_detour_when_it_is_shorter() {
        // the straight route now runs through a vertex far off the line
        let mut g = Graph::new();
        for x in [0.0, 1.0, 2.0, 3.0] {
            g.add_vertex(Sample::new(x, 0.0, 0.0), Some(0));
        }
        let detour = g.add_vertex(Sample::new(1.5, 2.0, 0.0), Some(1));
        let far = g.add_vertex(Sample::new(1.5, -100.0, 0.0), Some(0));
        for (a, b) in [(0, 1), (1, far), (far, 2), (2, 3), (0, detour), (detour, 3)] {
            g.add_edge(a, b).unwrap();
        }

        let path = PathFinder::new(&g).find_path(0, 3).unwrap().unwrap();
        assert_eq!(path.vertices(), &[0, detour, 3]);
        assert!((path.length() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn source_equal_to_target_is_a_single_vertex() {
        let g = diamond();
        let path = PathFinder::new(&g).find_path(2, 2).unwrap().unwrap();
        assert_eq!(path.vertices(), &[2]);
        assert_eq!(path.length(), 0.0);
        assert_eq!(path.source(), path.target());
    }

    #[test]
    fn disconnected_target_has_no_path() {
        let mut g = diamond();
        let lonely = g.add_vertex(Sample::new(50.0, 50.0, 0.0), Some(3));
        assert_eq!(PathFinder::new(&g).find_path(0, lonely).unwrap(), None);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let g = diamond();
        let err = PathFinder::new(&g).find_path(0, 99).unwrap_err();
        assert!(matches!(err, NavGraphError::VertexOutOfRange { index: 99, .. }));
    }

    #[test]
    fn plan_between_snaps_points_to_vertices() {
        let g = diamond();
        let finder = PathFinder::new(&g);

        let path = finder
            .plan_between(&Sample::new(-0.2, 0.1, 7.0), &Sample::new(2.9, 0.0, -3.0))
            .unwrap();
        assert_eq!(path.source(), 0);
        assert_eq!(path.target(), 3);
        assert_eq!(path.positions(&g).len(), 4);

        assert!(PathFinder::new(&Graph::new())
            .plan_between(&Sample::zeros(), &Sample::zeros())
            .is_none());
    }
}
