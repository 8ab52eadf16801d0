//! Region graph and shortest-path search.
//!
//! The graph owns its nodes plus a lazily built [`RasterIndex`] and
//! [`DistanceMatrix`]. Search comes in three variants: single-source
//! Dijkstra, a two-frontier "meet in the middle" search with per-source
//! rate divisors, and a three-frontier variant that terminates when a node
//! has been reached from all three sources.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use once_cell::sync::OnceCell;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::cell::{CellShape, GraphNode};
use crate::config::GraphConfig;
use crate::error::{GeodriftError, Result};
use crate::geometry::great_circle_distance;
use crate::matrix::DistanceMatrix;
use crate::raster::RasterIndex;

/// Min-heap entry keyed by tentative distance.
#[derive(Debug, Clone, Copy, PartialEq)]
struct QueueEntry {
    distance: f64,
    node: usize,
}

impl Eq for QueueEntry {}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so BinaryHeap pops the smallest distance first.
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One Dijkstra frontier in a multi-source search.
struct Frontier {
    /// Rate divisor: frontier advance order compares `distance / weight`.
    weight: f64,
    dist: Vec<f64>,
    prev: Vec<usize>,
    /// Nodes this frontier has assigned a tentative distance to.
    reached: Vec<bool>,
    heap: BinaryHeap<QueueEntry>,
}

impl Frontier {
    fn new(n: usize, source: usize, weight: f64) -> Self {
        let mut dist = vec![f64::INFINITY; n];
        dist[source] = 0.0;
        let mut prev = vec![usize::MAX; n];
        prev[source] = source;
        let mut reached = vec![false; n];
        reached[source] = true;
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry {
            distance: 0.0,
            node: source,
        });
        Self {
            weight,
            dist,
            prev,
            reached,
            heap,
        }
    }

    /// Normalized tentative best, or infinity when the frontier is spent.
    fn peek_normalised(&self) -> f64 {
        self.heap
            .peek()
            .map(|e| e.distance / self.weight)
            .unwrap_or(f64::INFINITY)
    }

    /// Walk predecessor links back from the meeting point to the source.
    fn path_to(&self, source: usize, meeting: usize) -> Vec<usize> {
        let mut path = vec![meeting];
        let mut i = meeting;
        while i != source {
            i = self.prev[i];
            path.push(i);
        }
        path.reverse();
        path
    }
}

/// Outcome of a two-source meet-in-the-middle search.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetResult {
    /// The first node reached by both frontiers.
    pub meeting: usize,
    /// Path from the first source to the meeting point, inclusive.
    pub path1: Vec<usize>,
    /// Path from the second source to the meeting point, inclusive.
    pub path2: Vec<usize>,
}

/// Outcome of a three-source meet-in-the-middle search.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetResult3 {
    /// The first node reached by all three frontiers.
    pub meeting: usize,
    /// Per-source paths to the meeting point, inclusive.
    pub paths: [Vec<usize>; 3],
}

/// Graph of geographic region cells with weighted undirected adjacency.
pub struct Graph {
    nodes: Vec<GraphNode>,
    config: GraphConfig,
    raster: OnceCell<RasterIndex>,
    matrix: OnceCell<DistanceMatrix>,
}

impl Graph {
    /// Build a graph from cell shapes, deriving adjacency from shared
    /// vertices: two cells are neighbors when they share a full edge (two
    /// vertices), or any vertex at all under `config.all_neighbors`.
    pub fn from_cells(cells: Vec<(CellShape, i32)>, config: GraphConfig) -> Self {
        let nodes: Vec<GraphNode> = cells
            .into_iter()
            .enumerate()
            .map(|(id, (shape, kind))| GraphNode::new(id, shape, kind))
            .collect();

        let mut graph = Self {
            nodes,
            config,
            raster: OnceCell::new(),
            matrix: OnceCell::new(),
        };
        graph.derive_neighbours();
        graph.set_up_weights();
        graph
    }

    /// Build a graph from pre-assembled nodes with explicit adjacency.
    ///
    /// Edge weights are computed from the config for any node whose weight
    /// array is empty; pre-set weights are kept as-is. Node ids must match
    /// storage order.
    pub fn from_nodes(nodes: Vec<GraphNode>, config: GraphConfig) -> Self {
        debug_assert!(nodes.iter().enumerate().all(|(i, n)| n.id == i));
        let mut graph = Self {
            nodes,
            config,
            raster: OnceCell::new(),
            matrix: OnceCell::new(),
        };
        graph.set_up_weights();
        graph
    }

    fn derive_neighbours(&mut self) {
        // Quantize vertices so cells stitched from the same mesh compare
        // equal despite floating-point noise.
        fn key(lat: f64, lon: f64) -> (i64, i64) {
            ((lat * 1e6).round() as i64, (lon * 1e6).round() as i64)
        }

        let mut by_vertex: FxHashMap<(i64, i64), SmallVec<[u32; 8]>> = FxHashMap::default();
        for node in &self.nodes {
            for v in node.shape().vertices() {
                by_vertex
                    .entry(key(v.lat, v.lon))
                    .or_default()
                    .push(node.id as u32);
            }
        }

        let required = if self.config.all_neighbors { 1 } else { 2 };
        for id in 0..self.nodes.len() {
            let mut shared: FxHashMap<u32, u32> = FxHashMap::default();
            for v in self.nodes[id].shape().vertices() {
                for &other in &by_vertex[&key(v.lat, v.lon)] {
                    if other as usize != id {
                        *shared.entry(other).or_insert(0) += 1;
                    }
                }
            }
            let mut neighbours: SmallVec<[usize; 6]> = shared
                .into_iter()
                .filter(|&(_, count)| count >= required)
                .map(|(other, _)| other as usize)
                .collect();
            neighbours.sort_unstable();
            self.nodes[id].neighbours = neighbours;
        }
    }

    fn set_up_weights(&mut self) {
        let centers: Vec<_> = self.nodes.iter().map(|n| *n.center()).collect();
        for node in &mut self.nodes {
            if !node.weights.is_empty() {
                debug_assert_eq!(node.weights.len(), node.neighbours.len());
                continue;
            }
            node.weights = if self.config.use_great_circle {
                node.neighbours
                    .iter()
                    .map(|&nb| great_circle_distance(node.center(), &centers[nb]))
                    .collect()
            } else {
                node.neighbours.iter().map(|_| 1.0).collect()
            };
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: usize) -> &GraphNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Scale the outgoing edge weights of one node, dropping any cached
    /// distance matrix since edge weights changed.
    pub fn scale_node_weights(&mut self, id: usize, scale: f64) {
        self.nodes[id].scale_weights(scale);
        self.matrix = OnceCell::new();
    }

    // ------------------------------------------------------------------
    // Spatial lookup

    /// The raster index, building it on first use.
    pub fn raster_index(&self) -> &RasterIndex {
        self.raster.get_or_init(|| {
            RasterIndex::build(
                &self.nodes,
                self.config.cells_per_degree,
                self.config.neighbor_multiplier,
            )
        })
    }

    /// Snap a coordinate to the nearest graph node, or `None` when it lies
    /// outside the indexed bounds.
    pub fn node_at(&self, lat: f64, lon: f64) -> Option<usize> {
        self.raster_index().query(lat, lon)
    }

    /// Network distance between two coordinates: both are snapped to their
    /// nearest nodes, then looked up in the distance matrix. `Ok(None)`
    /// when either coordinate falls outside the indexed bounds.
    pub fn coord_distance(
        &self,
        from: (f64, f64),
        to: (f64, f64),
    ) -> Result<Option<f64>> {
        let matrix = self.distance_matrix()?;
        let (Some(a), Some(b)) = (
            self.node_at(from.0, from.1),
            self.node_at(to.0, to.1),
        ) else {
            return Ok(None);
        };
        Ok(Some(matrix.distance(a, b)))
    }

    // ------------------------------------------------------------------
    // Shortest paths

    /// Dijkstra distances from `source` to every node. Unreachable nodes
    /// keep `f64::INFINITY`. The search runs until the frontier is fully
    /// exhausted; there is no early exit.
    pub fn single_source_distances(&self, source: usize) -> Vec<f64> {
        let mut dist = vec![f64::INFINITY; self.nodes.len()];
        dist[source] = 0.0;
        let mut heap = BinaryHeap::new();
        heap.push(QueueEntry {
            distance: 0.0,
            node: source,
        });
        while let Some(QueueEntry { distance, node }) = heap.pop() {
            if distance > dist[node] {
                continue;
            }
            let gnode = &self.nodes[node];
            for (i, &nb) in gnode.neighbours().iter().enumerate() {
                let next = distance + gnode.weight(i);
                if next < dist[nb] {
                    dist[nb] = next;
                    heap.push(QueueEntry {
                        distance: next,
                        node: nb,
                    });
                }
            }
        }
        dist
    }

    /// Relax the popped head of `frontier`. Returns the meeting node as
    /// soon as a newly relaxed node has already been reached by every
    /// frontier in `others`.
    fn advance(&self, frontier: &mut Frontier, others: &[&[bool]]) -> Option<usize> {
        let node = frontier.heap.pop()?.node;
        let dist = frontier.dist[node];
        let gnode = &self.nodes[node];
        for (i, &nb) in gnode.neighbours().iter().enumerate() {
            let next = dist + gnode.weight(i);
            if next < frontier.dist[nb] {
                frontier.dist[nb] = next;
                frontier.prev[nb] = node;
                frontier.reached[nb] = true;
                if others.iter().all(|reached| reached[nb]) {
                    return Some(nb);
                }
                frontier.heap.push(QueueEntry {
                    distance: next,
                    node: nb,
                });
            }
        }
        None
    }

    /// Two-source meet-in-the-middle search with per-source rate divisors.
    ///
    /// At each step the frontier with the smaller normalized tentative
    /// best (`tentative / weight`) advances; on a tie the second frontier
    /// moves. The search stops the instant one frontier relaxes a node the
    /// other has already reached, and that node is the meeting point.
    /// `None` when the sources are in different components.
    pub fn meet_in_middle(&self, s1: usize, w1: f64, s2: usize, w2: f64) -> Option<MeetResult> {
        let n = self.nodes.len();
        let mut f1 = Frontier::new(n, s1, w1);
        let mut f2 = Frontier::new(n, s2, w2);

        loop {
            let p1 = f1.peek_normalised();
            let p2 = f2.peek_normalised();
            if !p1.is_finite() && !p2.is_finite() {
                return None;
            }
            let meeting = if p1 < p2 {
                self.advance(&mut f1, &[&f2.reached])
            } else {
                self.advance(&mut f2, &[&f1.reached])
            };
            if let Some(meeting) = meeting {
                return Some(MeetResult {
                    meeting,
                    path1: f1.path_to(s1, meeting),
                    path2: f2.path_to(s2, meeting),
                });
            }
        }
    }

    /// Three-source variant: the frontier with the smallest normalized
    /// tentative best advances (earlier source wins ties), and the search
    /// stops when a newly relaxed node has been reached by both other
    /// frontiers.
    pub fn meet_in_middle_three(
        &self,
        s1: usize,
        w1: f64,
        s2: usize,
        w2: f64,
        s3: usize,
        w3: f64,
    ) -> Option<MeetResult3> {
        let n = self.nodes.len();
        let mut f1 = Frontier::new(n, s1, w1);
        let mut f2 = Frontier::new(n, s2, w2);
        let mut f3 = Frontier::new(n, s3, w3);

        loop {
            let p1 = f1.peek_normalised();
            let p2 = f2.peek_normalised();
            let p3 = f3.peek_normalised();
            if !p1.is_finite() && !p2.is_finite() && !p3.is_finite() {
                return None;
            }
            let meeting = if p1 <= p2 && p1 <= p3 {
                self.advance(&mut f1, &[&f2.reached, &f3.reached])
            } else if p2 <= p1 && p2 <= p3 {
                self.advance(&mut f2, &[&f1.reached, &f3.reached])
            } else {
                self.advance(&mut f3, &[&f1.reached, &f2.reached])
            };
            if let Some(meeting) = meeting {
                return Some(MeetResult3 {
                    meeting,
                    paths: [
                        f1.path_to(s1, meeting),
                        f2.path_to(s2, meeting),
                        f3.path_to(s3, meeting),
                    ],
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Distance matrix

    /// Build the all-pairs distance matrix, caching it on the graph.
    ///
    /// Node ids are partitioned into `parallelism` contiguous blocks, each
    /// block's rows computed by an independent Dijkstra sweep per node.
    /// Workers write disjoint rows, so the only synchronization is the
    /// fork-join barrier; no partial matrix is ever visible.
    pub fn build_distance_matrix(&self, parallelism: usize) -> &DistanceMatrix {
        self.matrix
            .get_or_init(|| self.compute_distance_matrix(parallelism))
    }

    /// The cached distance matrix, or [`GeodriftError::NotBuilt`].
    pub fn distance_matrix(&self) -> Result<&DistanceMatrix> {
        self.matrix
            .get()
            .ok_or(GeodriftError::NotBuilt("distance matrix"))
    }

    fn compute_distance_matrix(&self, parallelism: usize) -> DistanceMatrix {
        let n = self.nodes.len();
        if n == 0 {
            return DistanceMatrix::new(Vec::new());
        }
        let block = n.div_ceil(parallelism.max(1));
        let start = Instant::now();
        let mut rows: Vec<Vec<f64>> = vec![Vec::new(); n];
        rows.par_chunks_mut(block)
            .enumerate()
            .for_each(|(b, chunk)| {
                let base = b * block;
                for (i, row) in chunk.iter_mut().enumerate() {
                    *row = self.single_source_distances(base + i);
                }
                log::debug!("distance rows {}..{} done", base, base + chunk.len());
            });
        log::info!(
            "distance matrix over {} nodes built in {:.1?}",
            n,
            start.elapsed()
        );
        DistanceMatrix::new(rows)
    }

    /// Shortest-path distance between two nodes via the cached matrix.
    pub fn distance(&self, from: usize, to: usize) -> Result<f64> {
        Ok(self.distance_matrix()?.distance(from, to))
    }

    /// Node ids in non-decreasing distance order from `from`, ties broken
    /// by id.
    pub fn sorted_by_distance(&self, from: usize) -> Result<Vec<usize>> {
        Ok(self.distance_matrix()?.sorted_by_distance(from))
    }
}
