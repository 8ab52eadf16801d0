//! Distance/time diffusion model over a region graph.
//!
//! The log-likelihood of covering a network distance in a given time is an
//! intentionally simplified 1-D residual form, not a normalized 2-D radial
//! density. Downstream sampling depends on its exact shape, including the
//! zero-distance floor and the small-probability clamp in
//! [`DiffusionModel::transition_probabilities`], so the algebra here is
//! preserved as-is rather than corrected.

use crate::graph::Graph;
use crate::matrix::DistanceMatrix;

/// Floor substituted for a zero displacement so `ln(d)` stays finite.
const MIN_DISTANCE: f64 = 1e-5;

/// Probabilities below this after stabilization are clamped; samplers
/// require every transition to stay strictly positive.
const MIN_PROBABILITY: f64 = 1e-4;

/// Diffusion model over a graph's shortest-path distances.
///
/// Construction builds the graph's distance matrix; everything afterwards
/// is a read-only query.
pub struct DiffusionModel {
    graph: Graph,
    precision: f64,
}

impl DiffusionModel {
    /// Wrap a graph, building its distance matrix with the given worker
    /// count if it is not built yet.
    pub fn new(graph: Graph, precision: f64, parallelism: usize) -> Self {
        graph.build_distance_matrix(parallelism);
        Self { graph, precision }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    fn matrix(&self) -> &DistanceMatrix {
        // Already built in the constructor; this only reads the cache.
        self.graph.build_distance_matrix(1)
    }

    /// Log-likelihood of covering `distance` in `time` under the given
    /// precision. Zero distances are floored at 1e-5 to keep the result
    /// finite.
    pub fn log_likelihood(distance: f64, time: f64, precision: f64) -> f64 {
        let d = if distance == 0.0 { MIN_DISTANCE } else { distance };
        let inverse_variance = precision / time;
        d.ln() + 0.5 * inverse_variance.ln() - 0.5 * d * d * inverse_variance
    }

    /// Log-likelihood of moving between two graph nodes in `time`.
    pub fn pair_log_likelihood(&self, source: usize, target: usize, time: f64) -> f64 {
        Self::log_likelihood(self.matrix().distance(source, target), time, self.precision)
    }

    /// Per-branch log-likelihood: zero when the branch does not move.
    pub fn branch_log_likelihood(&self, source: usize, target: usize, time: f64) -> f64 {
        if source == target {
            return 0.0;
        }
        self.pair_log_likelihood(source, target, time)
    }

    /// Log transition likelihoods from `start` to every node in the graph.
    pub fn log_transition_probabilities(&self, start: usize, time: f64) -> Vec<f64> {
        self.matrix()
            .row(start)
            .iter()
            .map(|&d| Self::log_likelihood(d, time, self.precision))
            .collect()
    }

    /// Normalized transition probabilities from `start` to every node.
    pub fn transition_probabilities_from(&self, start: usize, time: f64) -> Vec<f64> {
        let mut p = self.log_transition_probabilities(start, time);
        log_to_probabilities(&mut p);
        p
    }

    /// Transition probability grid over `origins` × `dests` (row-major),
    /// stabilized by subtracting the maximum log value before
    /// exponentiating. Returns the grid and the log scale factor.
    ///
    /// Entries that underflow below 1e-4 are replaced by
    /// `1e-4 / (log_scale - log_p)`, a legacy floor that keeps every
    /// transition strictly positive while still ordering the tail.
    pub fn transition_probabilities(
        &self,
        origins: &[usize],
        dests: &[usize],
        time: f64,
    ) -> (Vec<f64>, f64) {
        let mut log_p = Vec::with_capacity(origins.len() * dests.len());
        for &source in origins {
            for &target in dests {
                log_p.push(self.pair_log_likelihood(source, target, time));
            }
        }
        let log_scale = log_p.iter().fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        let probabilities = log_p
            .into_iter()
            .map(|lp| {
                let p = (lp - log_scale).exp();
                if p < MIN_PROBABILITY {
                    MIN_PROBABILITY / (log_scale - lp)
                } else {
                    p
                }
            })
            .collect();
        (probabilities, log_scale)
    }

    /// Maximum-a-posteriori path from `source` to `target` given a total
    /// elapsed time, by recursive bisection: pick the unused node with the
    /// greatest product of forward and backward half-time transition
    /// probabilities as the waypoint and recurse on both halves. When no
    /// unused candidate remains the target is appended directly.
    pub fn calc_map_path(&self, source: usize, target: usize, time: f64) -> Vec<usize> {
        let mut path = vec![source];
        let mut used = vec![false; self.graph.len()];
        self.map_path_segment(&mut path, source, target, time, &mut used);
        path
    }

    fn map_path_segment(
        &self,
        path: &mut Vec<usize>,
        source: usize,
        target: usize,
        time: f64,
        used: &mut [bool],
    ) {
        used[source] = true;
        used[target] = true;

        if source == target {
            return;
        }
        if self.graph.node(target).is_neighbour(source) {
            path.push(target);
            return;
        }

        let p_from_source = self.transition_probabilities_from(source, time / 2.0);
        let p_from_target = self.transition_probabilities_from(target, time / 2.0);
        let mut max_p = f64::NEG_INFINITY;
        let mut waypoint = None;
        for i in 0..self.graph.len() {
            let p = p_from_source[i] * p_from_target[i];
            // Strict comparison keeps the first maximum found, so ties
            // resolve to the lowest id.
            if p > max_p && !used[i] {
                max_p = p;
                waypoint = Some(i);
            }
        }

        let Some(waypoint) = waypoint else {
            // Search space exhausted; accept the direct hop.
            path.push(target);
            return;
        };

        used[waypoint] = true;
        self.map_path_segment(path, source, waypoint, time / 2.0, used);
        self.map_path_segment(path, waypoint, target, time / 2.0, used);
    }

    /// Stationary frequencies: uniform over all nodes.
    pub fn frequencies(&self) -> Vec<f64> {
        let n = self.graph.len();
        vec![1.0 / n as f64; n]
    }

    /// Log probability of the root sitting at the given graph node,
    /// `ln(1/N)` under the uniform frequencies.
    pub fn root_log_frequency(&self, graph_node: usize) -> f64 {
        self.frequencies()[graph_node].ln()
    }
}

/// Convert log probabilities to normalized probabilities in place:
/// exponentiate relative to the maximum (NaN entries become zero), then
/// scale to sum to unity.
pub fn log_to_probabilities(log_p: &mut [f64]) {
    let mut max = f64::NEG_INFINITY;
    for &v in log_p.iter() {
        if !v.is_nan() {
            max = max.max(v);
        }
    }
    for v in log_p.iter_mut() {
        *v = if v.is_nan() { 0.0 } else { (*v - max).exp() };
    }
    let sum: f64 = log_p.iter().sum();
    for v in log_p.iter_mut() {
        *v /= sum;
    }
}
