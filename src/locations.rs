//! Taxon location tables: parsing, validation and snapping to the graph.
//!
//! Tables are comma-separated `name={lat} {long}` entries, e.g.
//! `sumatra=0.5 101.3, java=-7.5 110.0`. Matching against the taxon set is
//! case-insensitive and ignores whitespace in names. Unknown names in the
//! table only warn; a tip taxon that still has no location after the whole
//! table is scanned is fatal, and every such taxon is reported in one
//! error rather than aborting at the first offender.

use rustc_hash::FxHashMap;

use crate::error::{GeodriftError, Result};
use crate::geometry::{great_circle_distance, GeoPoint};
use crate::graph::Graph;

/// Sentinel latitude marking a tip with no parsed location yet.
const UNSET_LAT: f64 = -360.0;

/// Parse a location table against a taxon set, returning one position per
/// taxon in taxon order.
pub fn parse_location_table(table: &str, taxa: &[String]) -> Result<Vec<GeoPoint>> {
    let index_by_name: FxHashMap<String, usize> = taxa
        .iter()
        .enumerate()
        .map(|(i, name)| (name.to_lowercase(), i))
        .collect();

    let mut positions = vec![(UNSET_LAT, 0.0); taxa.len()];
    for entry in table.split(',') {
        if entry.trim().is_empty() {
            continue;
        }
        let Some((name, coords)) = entry.split_once('=') else {
            return Err(GeodriftError::InvalidInput(format!(
                "location entry {:?} is not of the form name=lat long",
                entry.trim()
            )));
        };
        let name: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        let Some(&taxon) = index_by_name.get(&name.to_lowercase()) else {
            log::warn!(
                "could not find taxon {:?} in taxon set, but a location was specified",
                name
            );
            continue;
        };
        let mut fields = coords.split_whitespace();
        let (Some(lat), Some(lon)) = (fields.next(), fields.next()) else {
            return Err(GeodriftError::InvalidInput(format!(
                "location for taxon {:?} needs a latitude and a longitude, got {:?}",
                name,
                coords.trim()
            )));
        };
        let lat: f64 = lat.parse().map_err(|_| {
            GeodriftError::InvalidInput(format!("bad latitude {:?} for taxon {:?}", lat, name))
        })?;
        let lon: f64 = lon.parse().map_err(|_| {
            GeodriftError::InvalidInput(format!("bad longitude {:?} for taxon {:?}", lon, name))
        })?;
        positions[taxon] = (lat, lon);
    }

    // Collect every missing tip before failing.
    let missing: Vec<String> = taxa
        .iter()
        .zip(&positions)
        .filter(|(_, &(lat, _))| lat == UNSET_LAT)
        .map(|(name, _)| {
            log::warn!("no location found for {:?}; typo perhaps?", name);
            name.clone()
        })
        .collect();
    if !missing.is_empty() {
        return Err(GeodriftError::MissingLocations(missing));
    }

    Ok(positions
        .into_iter()
        .map(|(lat, lon)| GeoPoint::new(lat, lon))
        .collect())
}

/// Snap tip positions to their nearest graph nodes through the raster
/// index. Positions outside the indexed bounds come back as `None`.
pub fn snap_tip_locations(graph: &Graph, positions: &[GeoPoint]) -> Vec<Option<usize>> {
    positions
        .iter()
        .map(|p| graph.node_at(p.lat, p.lon))
        .collect()
}

/// Dense symmetric matrix of great-circle distances between tip
/// positions, for models that diffuse over raw geographic distance
/// instead of the network.
pub fn pairwise_great_circle(positions: &[GeoPoint]) -> Vec<Vec<f64>> {
    let n = positions.len();
    let mut distances = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in i + 1..n {
            let d = great_circle_distance(&positions[i], &positions[j]);
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }
    distances
}
