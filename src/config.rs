//! Graph construction configuration.
//!
//! Serializable with per-field defaults so partial JSON configs work:
//!
//! ```rust
//! use geodrift::GraphConfig;
//!
//! let config: GraphConfig = serde_json::from_str(r#"{ "use_great_circle": false }"#).unwrap();
//! assert_eq!(config.cells_per_degree, 40);
//! ```

use serde::{Deserialize, Serialize};

/// Configuration for graph construction and the rasterized spatial index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Treat cells sharing a single vertex as neighbors, not only cells
    /// sharing a full edge (two vertices).
    #[serde(default)]
    pub all_neighbors: bool,

    /// Weight edges by great-circle distance between cell centers.
    /// When false every edge gets uniform weight 1.0.
    #[serde(default = "GraphConfig::default_use_great_circle")]
    pub use_great_circle: bool,

    /// Raster resolution: number of cells per minimum inter-node spacing
    /// unit when sizing the nearest-node lookup grid.
    #[serde(default = "GraphConfig::default_cells_per_degree")]
    pub cells_per_degree: u32,

    /// Multiplier on `cells_per_degree` giving the half-width of the cell
    /// window swept around each node during raster construction.
    #[serde(default = "GraphConfig::default_neighbor_multiplier")]
    pub neighbor_multiplier: f64,
}

impl GraphConfig {
    fn default_use_great_circle() -> bool {
        true
    }

    fn default_cells_per_degree() -> u32 {
        40
    }

    fn default_neighbor_multiplier() -> f64 {
        2.0
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            all_neighbors: false,
            use_great_circle: Self::default_use_great_circle(),
            cells_per_degree: Self::default_cells_per_degree(),
            neighbor_multiplier: Self::default_neighbor_multiplier(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GraphConfig::default();
        assert!(!config.all_neighbors);
        assert!(config.use_great_circle);
        assert_eq!(config.cells_per_degree, 40);
        assert_eq!(config.neighbor_multiplier, 2.0);
    }

    #[test]
    fn test_partial_json() {
        let config: GraphConfig =
            serde_json::from_str(r#"{ "all_neighbors": true, "cells_per_degree": 10 }"#).unwrap();
        assert!(config.all_neighbors);
        assert_eq!(config.cells_per_degree, 10);
        assert!(config.use_great_circle);
        assert_eq!(config.neighbor_multiplier, 2.0);
    }

    #[test]
    fn test_round_trip() {
        let config = GraphConfig {
            all_neighbors: true,
            use_great_circle: false,
            cells_per_degree: 20,
            neighbor_multiplier: 1.5,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: GraphConfig = serde_json::from_str(&json).unwrap();
        assert!(back.all_neighbors);
        assert!(!back.use_great_circle);
        assert_eq!(back.cells_per_degree, 20);
        assert_eq!(back.neighbor_multiplier, 1.5);
    }
}
