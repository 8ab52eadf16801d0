//! Graph-node cells: the concrete shapes a region graph is built from and
//! the node record carrying adjacency and edge weights.

use crate::geometry::{centroid, GeoPoint};
use smallvec::SmallVec;

/// Concrete cell geometry of a graph node.
///
/// Region graphs come in two flavours: triangular meshes and hexagonal
/// tilings (hexagonal grids carry the occasional pentagon, so that variant
/// holds a vector). The capability set is fixed: vertex enumeration and
/// center lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CellShape {
    /// A cell from a triangular mesh.
    Triangle([GeoPoint; 3]),
    /// A cell from a hexagonal tiling; 5 or 6 vertices.
    Hexagon(Vec<GeoPoint>),
}

impl CellShape {
    /// All vertices of the cell.
    pub fn vertices(&self) -> &[GeoPoint] {
        match self {
            CellShape::Triangle(v) => v,
            CellShape::Hexagon(v) => v,
        }
    }

    /// Spherical centroid of the cell's vertices.
    pub fn center(&self) -> GeoPoint {
        // Cells always have at least 3 vertices.
        centroid(self.vertices()).expect("cell has no vertices")
    }
}

/// A node in the region graph.
///
/// Ids are dense in `[0, N)` and match storage order in the graph. The
/// neighbor and weight arrays are parallel; weights are great-circle
/// distances between cell centers, or uniform 1.0 when configured.
#[derive(Debug, Clone)]
pub struct GraphNode {
    pub id: usize,
    shape: CellShape,
    center: GeoPoint,
    /// Type tag, e.g. whether the cell is over land, water or coast.
    /// Interpretation depends on the kind of graph.
    pub kind: i32,
    pub(crate) neighbours: SmallVec<[usize; 6]>,
    pub(crate) weights: SmallVec<[f64; 6]>,
}

impl GraphNode {
    /// Create a node with no adjacency yet. Neighbors and weights are
    /// filled in during graph construction.
    pub fn new(id: usize, shape: CellShape, kind: i32) -> Self {
        let center = shape.center();
        Self {
            id,
            shape,
            center,
            kind,
            neighbours: SmallVec::new(),
            weights: SmallVec::new(),
        }
    }

    pub fn shape(&self) -> &CellShape {
        &self.shape
    }

    /// Cached cell center in latitude/longitude.
    pub fn center(&self) -> &GeoPoint {
        &self.center
    }

    /// Neighbor node ids, in adjacency order.
    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    /// Edge weight to the i-th neighbor.
    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    /// Whether `other` is directly adjacent to this node.
    pub fn is_neighbour(&self, other: usize) -> bool {
        self.neighbours.contains(&other)
    }

    /// Append a neighbor; its edge weight is filled in from the graph
    /// config during graph construction.
    pub fn add_neighbour(&mut self, id: usize) {
        self.neighbours.push(id);
    }

    /// Append a neighbor with an explicit edge weight.
    pub fn add_weighted_neighbour(&mut self, id: usize, weight: f64) {
        self.neighbours.push(id);
        self.weights.push(weight);
    }

    /// Scale every outgoing edge weight, e.g. to penalise travel over a
    /// particular cell kind.
    pub fn scale_weights(&mut self, scale: f64) {
        for w in &mut self.weights {
            *w *= scale;
        }
    }

    /// Scale the weight of the i-th edge only.
    pub fn scale_weight(&mut self, i: usize, scale: f64) {
        self.weights[i] *= scale;
    }
}
