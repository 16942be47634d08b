//! Stop ordering: greedy nearest neighbour, optionally refined by 2-opt over
//! a travel-time matrix.
//!
//! Orders are expressed as indices into the candidate slice so the caller
//! keeps ownership of the POIs themselves.

use crate::constants::{TWO_OPT_EPSILON, UNREACHABLE_LEG_COST};
use crate::models::Coordinates;
use crate::models::distance::distance_km;

/// Pairwise travel durations in seconds.
///
/// Row/column 0 is the route start; row `i + 1` is candidate `i`. Missing
/// entries (`None`) are pairs the routing engine could not connect.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelTimeMatrix {
    durations: Vec<Vec<Option<f64>>>,
}

impl TravelTimeMatrix {
    pub fn new(durations: Vec<Vec<Option<f64>>>) -> Self {
        TravelTimeMatrix { durations }
    }

    /// Number of points (start included) the matrix describes.
    pub fn size(&self) -> usize {
        self.durations.len()
    }

    /// True when the matrix is square over exactly `points` entries.
    pub fn covers(&self, points: usize) -> bool {
        self.durations.len() == points && self.durations.iter().all(|row| row.len() == points)
    }

    fn cost(&self, from: usize, to: usize) -> f64 {
        self.durations
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .flatten()
            .filter(|d| d.is_finite())
            .unwrap_or(UNREACHABLE_LEG_COST)
    }

    /// Cost of the open path start -> order[0] -> order[1] -> ...
    pub fn path_cost(&self, order: &[usize]) -> f64 {
        let mut prev = 0;
        order
            .iter()
            .map(|&idx| {
                let leg = self.cost(prev, idx + 1);
                prev = idx + 1;
                leg
            })
            .sum()
    }
}

/// Greedy open-path ordering from `start`.
///
/// At each step the closest unvisited point wins; ties go to the point that
/// appears first in `points`. Returns a permutation of `0..points.len()`.
pub fn nearest_neighbor_order(start: &Coordinates, points: &[Coordinates]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut order = Vec::with_capacity(points.len());
    let mut current = *start;

    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_dist = f64::INFINITY;
        for (pos, &idx) in remaining.iter().enumerate() {
            let d = distance_km(&current, &points[idx]);
            if d < best_dist {
                best_dist = d;
                best_pos = pos;
            }
        }

        let next = remaining.remove(best_pos);
        current = points[next];
        order.push(next);
    }

    order
}

/// Improve an open path with segment reversals until no reversal saves time.
///
/// The start (matrix row 0) stays fixed. Every improvement restarts the scan,
/// so the result is a local optimum with respect to 2-opt moves. A matrix
/// that does not cover the order leaves it unchanged.
pub fn two_opt(order: Vec<usize>, matrix: &TravelTimeMatrix) -> Vec<usize> {
    if order.len() < 2 {
        return order;
    }
    if !matrix.covers(order.len() + 1) {
        tracing::warn!(
            stops = order.len(),
            matrix_size = matrix.size(),
            "Travel time matrix does not match the stop count, skipping 2-opt"
        );
        return order;
    }

    let mut best = order;
    let mut best_cost = matrix.path_cost(&best);
    let mut improvements = 0usize;

    'scan: loop {
        for i in 0..best.len() - 1 {
            for k in i + 1..best.len() {
                let mut candidate = best.clone();
                candidate[i..=k].reverse();
                let cost = matrix.path_cost(&candidate);
                if cost + TWO_OPT_EPSILON < best_cost {
                    best = candidate;
                    best_cost = cost;
                    improvements += 1;
                    continue 'scan;
                }
            }
        }
        break;
    }

    tracing::debug!(
        improvements = improvements,
        cost_secs = best_cost,
        "2-opt finished after {} improvements",
        improvements
    );
    best
}
