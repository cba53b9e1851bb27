// core/simplify.rs

// Thins out recorded trajectories before they become graph vertices. Each pass
// drops interior points that sit on a short, nearly straight stretch, but only
// every other candidate, so a long straight run shrinks gradually instead of
// collapsing in one pass. Passes repeat until one removes nothing.

// Dependencies
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::trajectory::{Sample, Trajectory};

/// Simplification thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyConfig {
    /// Largest allowed length of (next segment + previous segment) at a removed point
    pub desired_dist: f32,
    /// Smallest allowed bend cosine at a removed point
    pub optimize_tangent: f32,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        SimplifyConfig {
            desired_dist: 20.0,
            optimize_tangent: 0.0,
        }
    }
}

/// Iterative, parity-gated trajectory simplifier
pub struct TrajectorySimplifier {
    config: SimplifyConfig,
}

impl TrajectorySimplifier {
    /// Create a simplifier with the given thresholds
    pub fn new(config: &SimplifyConfig) -> Self {
        TrajectorySimplifier { config: *config }
    }

    /// Simplifies every trajectory, logging the overall reduction
    pub fn simplify_all(&self, trajectories: Vec<Trajectory>) -> Vec<Trajectory> {
        let before: usize = trajectories.iter().map(Trajectory::len).sum();
        let simplified: Vec<Trajectory> = trajectories.iter().map(|t| self.simplify(t)).collect();
        let after: usize = simplified.iter().map(Trajectory::len).sum();

        info!("Filtered trajectories, vertices {} -> {}", before, after);
        simplified
    }

    /// Runs passes until one removes no point. Endpoints are never removed and
    /// trajectories without interior points come back unchanged.
    /// Every call restarts at pass 1, so simplifying an already simplified
    /// trajectory can remove further points when the first call stopped on
    /// an even pass.
    pub fn simplify(&self, trajectory: &Trajectory) -> Trajectory {
        let mut points = trajectory.points().to_vec();
        if points.len() < 3 {
            return trajectory.clone();
        }

        let mut pass = 1;
        loop {
            let kept = self.run_pass(&points, pass);
            if kept.len() == points.len() {
                debug!(
                    "Simplified {} -> {} points in {} passes",
                    trajectory.len(),
                    kept.len(),
                    pass
                );
                return Trajectory::new(kept);
            }
            points = kept;
            pass += 1;
        }
    }

    fn run_pass(&self, points: &[Sample], pass: usize) -> Vec<Sample> {
        let last = points.len() - 1;
        let mut kept = Vec::with_capacity(points.len());

        kept.push(points[0]);
        for i in 1..last {
            // Parity gate: only every other index is a candidate in a given pass.
            if i % 2 == pass % 2 || self.must_keep(&points[i - 1], &points[i], &points[i + 1]) {
                kept.push(points[i]);
            }
        }
        kept.push(points[last]);

        kept
    }

    fn must_keep(&self, previous: &Sample, point: &Sample, next: &Sample) -> bool {
        let outgoing = next - point;
        let incoming = point - previous;

        let deviation = (outgoing + incoming).norm();
        // NaN for a zero-length segment, which never forces a keep.
        let bend = outgoing.dot(&incoming) / outgoing.norm() / incoming.norm();

        deviation > self.config.desired_dist || bend < self.config.optimize_tangent
    }
}
