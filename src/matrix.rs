//! Dense all-pairs shortest-path distance matrix.

/// Symmetric N×N matrix of shortest-path lengths through the graph.
///
/// Built once from per-node Dijkstra sweeps and immutable thereafter.
/// Entries between disconnected components are `f64::INFINITY`, never
/// zero, so downstream likelihoods fail loudly instead of silently.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    rows: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    pub(crate) fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Number of nodes the matrix covers.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Shortest-path distance from `from` to `to`.
    pub fn distance(&self, from: usize, to: usize) -> f64 {
        self.rows[from][to]
    }

    /// Full distance row for a source node.
    pub fn row(&self, from: usize) -> &[f64] {
        &self.rows[from]
    }

    /// Node ids in non-decreasing distance order from `from`, ties broken
    /// by original id. `from` itself comes first at distance zero.
    pub fn sorted_by_distance(&self, from: usize) -> Vec<usize> {
        let row = &self.rows[from];
        let mut index: Vec<usize> = (0..row.len()).collect();
        // Stable sort keeps equal-distance ids in ascending order.
        index.sort_by(|&a, &b| row[a].total_cmp(&row[b]));
        index
    }
}
