//! Rasterized nearest-node lookup.
//!
//! Maps an arbitrary latitude/longitude to the closest graph node in O(1)
//! by precomputing a 2D raster over the inflated bounding box of the node
//! geometry. The structure is explicitly approximate: when deciding which
//! node owns a raster cell, only a node and its direct neighbors ever
//! compete, so a cell adjoining a third, non-adjacent node can be
//! mis-assigned. Downstream consumers only need "close enough" snapping of
//! coordinates to nodes, not exact nearest-neighbor semantics.

use crate::cell::GraphNode;

const EMPTY: u32 = u32::MAX;

/// Approximate nearest-node raster over a set of graph nodes.
///
/// Built once; queries are read-only thereafter.
#[derive(Debug)]
pub struct RasterIndex {
    min_lat: f64,
    min_lon: f64,
    delta_lat: f64,
    delta_lon: f64,
    lat_steps: usize,
    lon_steps: usize,
    /// Row-major occupant grid, `EMPTY` where no node claimed the cell.
    cells: Vec<u32>,
}

impl RasterIndex {
    /// Build the raster from a node set.
    ///
    /// `cells_per_degree` controls how many raster cells subdivide the
    /// minimum spacing between adjacent node centers; `neighbor_multiplier`
    /// scales the window of cells swept around each node's home cell.
    pub fn build(nodes: &[GraphNode], cells_per_degree: u32, neighbor_multiplier: f64) -> Self {
        // Bounding box over every vertex of every cell, inflated by 10%
        // per side so queries just outside the hull still resolve.
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        for node in nodes {
            for v in node.shape().vertices() {
                min_lat = min_lat.min(v.lat);
                max_lat = max_lat.max(v.lat);
                min_lon = min_lon.min(v.lon);
                max_lon = max_lon.max(v.lon);
            }
        }
        let dy = (max_lat - min_lat) * 0.10;
        let dx = (max_lon - min_lon) * 0.10;
        min_lat -= dy;
        max_lat += dy;
        min_lon -= dx;
        max_lon += dx;

        // Minimum angular spacing between adjacent centers, tracked per
        // axis; each edge contributes to whichever axis dominates it.
        let mut delta_lat = f64::INFINITY;
        let mut delta_lon = f64::INFINITY;
        for node in nodes {
            let center = node.center();
            for &nb in node.neighbours() {
                let nbcenter = nodes[nb].center();
                let d_lat = (center.lat - nbcenter.lat).abs();
                let d_lon = (center.lon - nbcenter.lon).abs();
                if d_lat < d_lon {
                    delta_lon = delta_lon.min(d_lon);
                } else {
                    delta_lat = delta_lat.min(d_lat);
                }
            }
        }
        // Graphs without usable adjacency fall back to one spacing unit
        // per axis over the whole box.
        if !delta_lat.is_finite() || delta_lat <= 0.0 {
            delta_lat = (max_lat - min_lat).max(1e-9);
        }
        if !delta_lon.is_finite() || delta_lon <= 0.0 {
            delta_lon = (max_lon - min_lon).max(1e-9);
        }

        let x = cells_per_degree as usize;
        let lat_steps =
            (x * ((max_lat - min_lat + delta_lat * 0.9999) / delta_lat) as usize).max(1);
        let lon_steps =
            (x * ((max_lon - min_lon + delta_lon * 0.9999) / delta_lon) as usize).max(1);
        let delta_lat = (max_lat - min_lat) / lat_steps as f64;
        let delta_lon = (max_lon - min_lon) / lon_steps as f64;

        let mut index = Self {
            min_lat,
            min_lon,
            delta_lat,
            delta_lon,
            lat_steps,
            lon_steps,
            cells: vec![EMPTY; lat_steps * lon_steps],
        };

        // Stamp every node's home cell.
        for node in nodes {
            let center = node.center();
            if let Some((y, x)) = index.cell_of(center.lat, center.lon) {
                index.cells[y * lon_steps + x] = node.id as u32;
            }
        }

        // Sweep a window around each home cell and let the node and its
        // direct neighbors compete for each cell, keeping the strictly
        // closest occupant.
        let multi = (cells_per_degree as f64 * neighbor_multiplier) as i64;
        for node in nodes {
            let center = node.center();
            let home_y = ((center.lat - min_lat + delta_lat / 2.0) / delta_lat).floor() as i64;
            let home_x = ((center.lon - min_lon + delta_lon / 2.0) / delta_lon).floor() as i64;
            for i in -multi..=multi {
                let y = home_y + i;
                if y < 0 || y >= lat_steps as i64 {
                    continue;
                }
                let lat0 = min_lat + y as f64 * delta_lat + delta_lat / 2.0;
                for j in -multi..=multi {
                    let x = home_x + j;
                    if x < 0 || x >= lon_steps as i64 {
                        continue;
                    }
                    let lon0 = min_lon + x as f64 * delta_lon + delta_lon / 2.0;

                    // Closest of {node, direct neighbors}; first wins ties.
                    let mut best = node.id;
                    let mut best_dist = center.squared_degree_distance(lat0, lon0);
                    for &nb in node.neighbours() {
                        let d = nodes[nb].center().squared_degree_distance(lat0, lon0);
                        if d < best_dist {
                            best = nb;
                            best_dist = d;
                        }
                    }

                    let slot = &mut index.cells[y as usize * lon_steps + x as usize];
                    if *slot == EMPTY {
                        *slot = best as u32;
                    } else {
                        let incumbent = nodes[*slot as usize].center();
                        if incumbent.squared_degree_distance(lat0, lon0) > best_dist {
                            *slot = best as u32;
                        }
                    }
                }
            }
        }

        // Every node should resolve to itself; a miss here means the
        // raster resolution is too coarse for this mesh.
        for node in nodes {
            let center = node.center();
            match index.query(center.lat, center.lon) {
                Some(id) if id == node.id => {}
                other => {
                    log::warn!(
                        "node {} is not closest to its own center (got {:?})",
                        node.id,
                        other
                    );
                }
            }
        }

        log::debug!(
            "raster index built: {}x{} cells over [{:.3}, {:.3}] x [{:.3}, {:.3}]",
            lat_steps,
            lon_steps,
            min_lat,
            min_lat + delta_lat * lat_steps as f64,
            min_lon,
            min_lon + delta_lon * lon_steps as f64,
        );
        index
    }

    /// Raster cell holding the given coordinate, or `None` outside bounds.
    fn cell_of(&self, lat: f64, lon: f64) -> Option<(usize, usize)> {
        let y = (lat - self.min_lat + self.delta_lat / 2.0) / self.delta_lat;
        let x = (lon - self.min_lon + self.delta_lon / 2.0) / self.delta_lon;
        if y < 0.0 || x < 0.0 {
            return None;
        }
        let (y, x) = (y as usize, x as usize);
        if y >= self.lat_steps || x >= self.lon_steps {
            return None;
        }
        Some((y, x))
    }

    /// The node judged closest to the given coordinate, or `None` when the
    /// coordinate falls outside the indexed bounds or in an unclaimed cell.
    pub fn query(&self, lat: f64, lon: f64) -> Option<usize> {
        let (y, x) = self.cell_of(lat, lon)?;
        match self.cells[y * self.lon_steps + x] {
            EMPTY => None,
            id => Some(id as usize),
        }
    }

    /// Raster dimensions as (latitude steps, longitude steps).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.lat_steps, self.lon_steps)
    }
}
