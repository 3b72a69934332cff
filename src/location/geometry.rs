//! Distance and region-identifier helpers.
//!
//! This module provides functions for:
//! - Great-circle distance between two coordinates (Haversine)
//! - Deterministic region identifiers derived from a coordinate

use super::types::Coordinates;

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Geohash length used for region identifiers.
///
/// A 12-character geohash cell is a few centimeters across, so two fixes
/// only share an identifier when they are effectively the same point.
pub const IDENTIFIER_GEOHASH_PRECISION: usize = 12;

/// Calculates the great-circle distance between two coordinates in meters.
///
/// Uses the Haversine formula on a spherical Earth, which is accurate to
/// well under 0.5% for the distances a geofence cares about.
///
/// # Examples
///
/// ```
/// use fencetrack::location::{distance_meters, Coordinates};
///
/// let a = Coordinates::new(0.0, 0.0);
/// let b = Coordinates::new(0.0, 1.0);
/// let d = distance_meters(a, b);
/// assert!((d - 111_195.0).abs() < 10.0); // One degree of longitude at the equator
/// ```
#[must_use]
pub fn distance_meters(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Builds the identifier for a region centered at `center`.
///
/// The identifier is `tag`, a colon, and the geohash of the center. Invalid
/// coordinates (which geohash cannot encode) fall back to the raw decimal
/// representation so the identifier is still deterministic.
///
/// # Examples
///
/// ```
/// use fencetrack::location::{region_identifier, Coordinates};
///
/// let id = region_identifier("fencetrack", Coordinates::new(37.7749, -122.4194));
/// assert!(id.starts_with("fencetrack:9q8yy"));
/// ```
#[must_use]
pub fn region_identifier(tag: &str, center: Coordinates) -> String {
    let encoded = geohash::encode(
        geohash::Coord {
            x: center.longitude,
            y: center.latitude,
        },
        IDENTIFIER_GEOHASH_PRECISION,
    )
    .unwrap_or_else(|_| format!("{},{}", center.latitude, center.longitude));

    format!("{tag}:{encoded}")
}
