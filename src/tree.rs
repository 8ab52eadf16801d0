//! Collaborator interfaces toward the inference host, plus the
//! tree-location moves built on them.
//!
//! The crate does not own tree state. The host supplies a
//! [`TreeTopologyProvider`] for topology queries, a [`LocationAccessor`]
//! for the per-tree-node graph assignment, a [`RandomSource`] for draws,
//! and a [`ClockRateProvider`] for branch rate multipliers. Internal-node
//! locations follow the island-hop convention: an internal node's location
//! is always the id of one of its two children, and resolving the chain of
//! child links down to a leaf yields the actual graph node.

use crate::error::{GeodriftError, Result};

/// Read access to a binary tree's topology.
///
/// Node ids are dense in `[0, node_count)`, with leaves occupying
/// `[0, leaf_count)` and internal nodes the rest.
pub trait TreeTopologyProvider {
    fn node_count(&self) -> usize;
    fn leaf_count(&self) -> usize;
    fn root(&self) -> usize;
    /// Left and right child of an internal node; `None` for a leaf.
    fn children(&self, node: usize) -> Option<(usize, usize)>;
    /// Parent of a node; `None` for the root.
    fn parent(&self, node: usize) -> Option<usize>;
    /// Height of a node above the tips; parents are at least as high as
    /// their children.
    fn height(&self, node: usize) -> f64;
}

/// Mutable per-tree-node location state owned by the host.
///
/// For leaves the value is a graph-node id; for internal nodes it is a
/// child tree-node id (see the module docs). That invariant is enforced by
/// the operators here and assumed, not verified, by consumers.
pub trait LocationAccessor {
    fn location(&self, tree_node: usize) -> usize;
    fn set_location(&mut self, tree_node: usize, value: usize);
}

/// Uniform random draws, injected explicitly rather than read from
/// process-wide state.
pub trait RandomSource {
    /// Uniform draw from `[0, bound)`.
    fn next_usize(&mut self, bound: usize) -> usize;
    fn next_bool(&mut self) -> bool;
}

/// Per-branch clock rate multiplier.
pub trait ClockRateProvider {
    fn rate_for_branch(&self, tree_node: usize) -> f64;
}

impl LocationAccessor for Vec<usize> {
    fn location(&self, tree_node: usize) -> usize {
        self[tree_node]
    }

    fn set_location(&mut self, tree_node: usize, value: usize) {
        self[tree_node] = value;
    }
}

/// A single fixed rate for every branch.
pub struct StrictClock(pub f64);

impl ClockRateProvider for StrictClock {
    fn rate_for_branch(&self, _tree_node: usize) -> f64 {
        self.0
    }
}

/// Nodes of the tree in post-order (children before parents), using an
/// explicit stack so deep trees cannot overflow the call stack.
pub fn post_order(tree: &impl TreeTopologyProvider) -> Vec<usize> {
    let mut order = Vec::with_capacity(tree.node_count());
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        order.push(node);
        if let Some((left, right)) = tree.children(node) {
            stack.push(left);
            stack.push(right);
        }
    }
    // Reversed pre-order with right visited before left is a valid
    // post-order: every child lands before its parent.
    order.reverse();
    order
}

/// Randomly assign every internal node the id of one of its children.
/// Used to seed the location state before sampling starts.
pub fn initialise_locations(
    tree: &impl TreeTopologyProvider,
    locations: &mut impl LocationAccessor,
    random: &mut impl RandomSource,
) {
    for node in post_order(tree) {
        if let Some((left, right)) = tree.children(node) {
            let pick = if random.next_bool() { left } else { right };
            locations.set_location(node, pick);
        }
    }
}

/// Island-hop proposal: move one random internal node's location to one of
/// its children. Returns the log Hastings ratio, which is zero for this
/// symmetric move.
pub fn island_hop_proposal(
    tree: &impl TreeTopologyProvider,
    locations: &mut impl LocationAccessor,
    random: &mut impl RandomSource,
) -> f64 {
    let internal_count = tree.node_count() - tree.leaf_count();
    let node = tree.leaf_count() + random.next_usize(internal_count);
    let (left, right) = tree
        .children(node)
        .expect("internal node ids start at leaf_count");
    let pick = if random.next_bool() { left } else { right };
    if pick != locations.location(node) {
        locations.set_location(node, pick);
    }
    0.0
}

/// Repair location state after a topology move: any internal node whose
/// location is no longer one of its children gets a fresh random child.
/// Returns how many assignments were repaired.
pub fn resync_locations(
    tree: &impl TreeTopologyProvider,
    locations: &mut impl LocationAccessor,
    random: &mut impl RandomSource,
) -> usize {
    let mut repaired = 0;
    for node in tree.leaf_count()..tree.node_count() {
        let Some((left, right)) = tree.children(node) else {
            continue;
        };
        let current = locations.location(node);
        if current != left && current != right {
            let pick = if random.next_bool() { left } else { right };
            locations.set_location(node, pick);
            repaired += 1;
        }
    }
    repaired
}

/// Resolve each tree node's graph assignment by following internal
/// child links down to a leaf.
///
/// Fails with [`GeodriftError::InvalidLocation`] when an internal node's
/// location is not one of its children, which indicates a topology move
/// ran without [`resync_locations`].
pub fn collect_graph_locations(
    tree: &impl TreeTopologyProvider,
    locations: &impl LocationAccessor,
) -> Result<Vec<usize>> {
    let mut values = vec![0usize; tree.node_count()];
    for node in post_order(tree) {
        match tree.children(node) {
            None => values[node] = locations.location(node),
            Some((left, right)) => {
                let loc = locations.location(node);
                if loc != left && loc != right {
                    return Err(GeodriftError::InvalidLocation {
                        node,
                        location: loc,
                        left,
                        right,
                    });
                }
                values[node] = values[loc];
            }
        }
    }
    Ok(values)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_post_order_children_before_parents() {
        let tree = three_leaf_tree();
        let order = post_order(&tree);
        assert_eq!(order.len(), 5);
        let pos = |n: usize| order.iter().position(|&x| x == n).unwrap();
        assert!(pos(0) < pos(3));
        assert!(pos(1) < pos(3));
        assert!(pos(3) < pos(4));
        assert!(pos(2) < pos(4));
    }

    #[test]
    fn test_initialise_locations_assigns_children() {
        let tree = three_leaf_tree();
        let mut locations = vec![0usize, 1, 2, 99, 99];
        let mut random = ScriptedRandom {
            bools: vec![true, false],
            ints: vec![],
        };
        initialise_locations(&tree, &mut locations, &mut random);
        assert_eq!(locations[3], 0); // true picks the left child
        assert_eq!(locations[4], 2); // false picks the right child
    }

    #[test]
    fn test_island_hop_proposal() {
        let tree = three_leaf_tree();
        let mut locations = vec![0usize, 1, 2, 0, 3];
        let mut random = ScriptedRandom {
            bools: vec![false],
            ints: vec![0], // internal node 3
        };
        let log_hr = island_hop_proposal(&tree, &mut locations, &mut random);
        assert_eq!(log_hr, 0.0);
        assert_eq!(locations[3], 1);
    }

    #[test]
    fn test_resync_repairs_only_stale_assignments() {
        let tree = three_leaf_tree();
        // Node 3 is valid (points at child 0); node 4 is stale.
        let mut locations = vec![0usize, 1, 2, 0, 1];
        let mut random = ScriptedRandom {
            bools: vec![true],
            ints: vec![],
        };
        let repaired = resync_locations(&tree, &mut locations, &mut random);
        assert_eq!(repaired, 1);
        assert_eq!(locations[3], 0);
        assert_eq!(locations[4], 3);
    }

    #[test]
    fn test_collect_graph_locations() {
        let tree = three_leaf_tree();
        // Leaves at graph nodes 7, 8, 9; node 3 follows leaf 1, root
        // follows node 3.
        let locations = vec![7usize, 8, 9, 1, 3];
        let resolved = collect_graph_locations(&tree, &locations).unwrap();
        assert_eq!(resolved, vec![7, 8, 9, 8, 8]);
    }

    #[test]
    fn test_collect_graph_locations_invalid() {
        let tree = three_leaf_tree();
        // Root points at leaf 0, which is not one of its children.
        let locations = vec![7usize, 8, 9, 1, 0];
        let err = collect_graph_locations(&tree, &locations).unwrap_err();
        assert!(matches!(
            err,
            crate::error::GeodriftError::InvalidLocation { node: 4, .. }
        ));
    }
}
