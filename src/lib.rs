//! Network-distance diffusion over graphs of geographic regions.
//!
//! A region graph connects cells on the earth's surface; shortest paths
//! through it stand in for migration distance. On top of the graph sit a
//! rasterized nearest-node lookup for snapping coordinates to cells, a
//! dense all-pairs distance matrix (optionally built in parallel), and a
//! diffusion model that scores distance/time pairs and reconstructs
//! maximum-a-posteriori migration paths.
//!
//! ```rust
//! use geodrift::{CellShape, GeoPoint, Graph, GraphConfig};
//!
//! let a = CellShape::Triangle([
//!     GeoPoint::new(0.0, 0.0),
//!     GeoPoint::new(0.0, 1.0),
//!     GeoPoint::new(1.0, 0.0),
//! ]);
//! let b = CellShape::Triangle([
//!     GeoPoint::new(0.0, 0.0),
//!     GeoPoint::new(0.0, 1.0),
//!     GeoPoint::new(-1.0, 1.0),
//! ]);
//!
//! let graph = Graph::from_cells(vec![(a, 0), (b, 0)], GraphConfig::default());
//! let matrix = graph.build_distance_matrix(1);
//! assert_eq!(matrix.distance(0, 0), 0.0);
//! assert_eq!(matrix.distance(0, 1), matrix.distance(1, 0));
//! ```

pub mod cell;
pub mod config;
pub mod diffusion;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod likelihood;
pub mod locations;
pub mod matrix;
pub mod raster;
pub mod tree;

pub use cell::{CellShape, GraphNode};
pub use config::GraphConfig;
pub use diffusion::{log_to_probabilities, DiffusionModel};
pub use error::{GeodriftError, Result};
pub use geometry::{great_circle_distance, GeoPoint};
pub use graph::{Graph, MeetResult, MeetResult3};
pub use likelihood::sampled_trait_log_likelihood;
pub use locations::{parse_location_table, snap_tip_locations};
pub use matrix::DistanceMatrix;
pub use raster::RasterIndex;
pub use tree::{
    ClockRateProvider, LocationAccessor, RandomSource, StrictClock, TreeTopologyProvider,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{CellShape, GeoPoint, GeodriftError, Graph, GraphConfig, Result};

    pub use crate::{DiffusionModel, DistanceMatrix, RasterIndex};

    pub use crate::tree::{
        ClockRateProvider, LocationAccessor, RandomSource, TreeTopologyProvider,
    };
}
