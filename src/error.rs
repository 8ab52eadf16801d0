//! Error types for geodrift operations.

use thiserror::Error;

/// Convenience result type used throughout the crate.
pub type Result<T> = std::result::Result<T, GeodriftError>;

/// Errors produced while building or querying a region graph.
///
/// Two conditions that might look like errors deliberately are not:
/// a spatial lookup outside the indexed raster returns `None`, and a
/// pairwise distance between disconnected components is `f64::INFINITY`.
/// Both are ordinary results the caller is expected to handle.
#[derive(Error, Debug)]
pub enum GeodriftError {
    /// One or more tip taxa have no location after scanning the whole
    /// location table. Collected in full, not first-offender-aborts.
    #[error("no location specified for taxa: {}", .0.join(", "))]
    MissingLocations(Vec<String>),

    /// An internal tree node's location is not one of its two children.
    /// This invariant is maintained by the operator layer; a violation
    /// usually means a topology move ran without the location resync.
    #[error(
        "internal node {node} has location {location}, expected child {left} or {right}; \
         run the location resync after every topology change"
    )]
    InvalidLocation {
        node: usize,
        location: usize,
        left: usize,
        right: usize,
    },

    /// Malformed input, e.g. an entry in the location table that does not
    /// parse as `name={lat} {long}`.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A graph operation was requested before its prerequisite was built.
    #[error("{0} has not been built yet")]
    NotBuilt(&'static str),
}
