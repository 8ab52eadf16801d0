//! Point-on-sphere geometry: latitude/longitude with cached Cartesian
//! coordinates, conversions, and great-circle measurement.
//!
//! Great-circle distances delegate to the `geo` crate's Haversine
//! implementation and are returned in meters.

use geo::{Distance, Haversine, Point};

/// A point on the unit sphere, in degrees of latitude and longitude,
/// with its unit Cartesian vector cached for geometric operations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    cart: [f64; 3],
}

impl GeoPoint {
    /// Create a point from latitude and longitude in degrees.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            cart: spherical_to_cartesian(lat, lon),
        }
    }

    /// Create a point from a Cartesian vector, normalising it onto the
    /// unit sphere first.
    pub fn from_cartesian(cart: [f64; 3]) -> Self {
        let cart = normalise(cart);
        let (lat, lon) = cartesian_to_spherical(cart);
        Self { lat, lon, cart }
    }

    /// Unit Cartesian coordinates of this point.
    pub fn cartesian(&self) -> [f64; 3] {
        self.cart
    }

    /// Squared planar distance in degree space. Used for raster-cell
    /// occupancy comparisons where only the ordering matters.
    pub fn squared_degree_distance(&self, lat: f64, lon: f64) -> f64 {
        let dlat = self.lat - lat;
        let dlon = self.lon - lon;
        dlat * dlat + dlon * dlon
    }
}

/// Convert (latitude, longitude) in degrees to unit Cartesian (x, y, z).
pub fn spherical_to_cartesian(lat: f64, lon: f64) -> [f64; 3] {
    let phi = lon.to_radians();
    let theta = (90.0 - lat).to_radians();
    [
        theta.sin() * phi.cos(),
        theta.sin() * phi.sin(),
        theta.cos(),
    ]
}

/// Inverse of [`spherical_to_cartesian`].
pub fn cartesian_to_spherical(cart: [f64; 3]) -> (f64, f64) {
    let lat = (-cart[2]).acos().to_degrees() - 90.0;
    let lon = cart[1].atan2(cart[0]).to_degrees();
    (lat, lon)
}

fn normalise(v: [f64; 3]) -> [f64; 3] {
    let len = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Great-circle distance between two points, in meters.
pub fn great_circle_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    Haversine.distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

/// Spherical midpoint of two points: mean of the Cartesian vectors,
/// projected back onto the sphere.
pub fn midpoint(a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    let ca = a.cartesian();
    let cb = b.cartesian();
    GeoPoint::from_cartesian([
        (ca[0] + cb[0]) / 2.0,
        (ca[1] + cb[1]) / 2.0,
        (ca[2] + cb[2]) / 2.0,
    ])
}

/// Spherical centroid of a set of points. Returns `None` for an empty set.
pub fn centroid(points: &[GeoPoint]) -> Option<GeoPoint> {
    if points.is_empty() {
        return None;
    }
    let mut sum = [0.0; 3];
    for p in points {
        let c = p.cartesian();
        sum[0] += c[0];
        sum[1] += c[1];
        sum[2] += c[2];
    }
    let n = points.len() as f64;
    Some(GeoPoint::from_cartesian([
        sum[0] / n,
        sum[1] / n,
        sum[2] / n,
    ]))
}
