//! Tree-wide trait likelihood for sampled locations.

use crate::diffusion::DiffusionModel;
use crate::tree::{ClockRateProvider, TreeTopologyProvider};

/// Clamp for branch terms that come out NaN or infinite, so one
/// degenerate branch cannot poison the whole tree score.
const DEGENERATE_BRANCH_LOG_P: f64 = -1000.0;

/// Log-likelihood of the sampled locations over a whole tree: one
/// diffusion term per branch, with branch time scaled by the clock rate,
/// plus the root frequency term.
///
/// `graph_locations` holds the resolved graph node for every tree node,
/// as produced by [`crate::tree::collect_graph_locations`].
pub fn sampled_trait_log_likelihood(
    model: &DiffusionModel,
    tree: &impl TreeTopologyProvider,
    graph_locations: &[usize],
    clock: &impl ClockRateProvider,
) -> f64 {
    let mut log_p = 0.0;
    for node in 0..tree.node_count() {
        match tree.parent(node) {
            Some(parent) => {
                let rate = clock.rate_for_branch(node);
                let time = (tree.height(parent) - tree.height(node)) * rate;
                let mut p = model.branch_log_likelihood(
                    graph_locations[parent],
                    graph_locations[node],
                    time,
                );
                if !p.is_finite() {
                    p = DEGENERATE_BRANCH_LOG_P;
                }
                log_p += p;
            }
            None => {
                log_p += model.root_log_frequency(graph_locations[node]);
            }
        }
    }
    log_p
}
