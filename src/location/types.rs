//! Location data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::geometry::distance_meters;

/// A latitude/longitude pair in decimal degrees (WGS 84).
///
/// # Example
///
/// ```
/// use fencetrack::location::Coordinates;
///
/// let coordinates = Coordinates::new(37.7749, -122.4194);
/// assert!(coordinates.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees, -90.0 to 90.0
    pub latitude: f64,

    /// Longitude in degrees, -180.0 to 180.0
    pub longitude: f64,
}

impl Coordinates {
    /// Creates a new coordinate pair.
    ///
    /// Values are stored as given. Use [`is_valid`](Self::is_valid) to check
    /// them before passing them to a provider.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns true if both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in meters.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        distance_meters(*self, *other)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A single location fix delivered by the positioning provider.
///
/// Fixes are never persisted or transmitted by the tracker; the host only
/// ever receives the [`Coordinates`] of a fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Where the fix was taken
    pub coordinates: Coordinates,

    /// Radius of uncertainty in meters, if the provider reports one
    pub horizontal_accuracy: Option<f64>,

    /// When the fix was taken (UTC)
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    /// Creates a fix at the given coordinates, timestamped now.
    ///
    /// # Examples
    ///
    /// ```
    /// use fencetrack::location::LocationFix;
    ///
    /// let fix = LocationFix::new(51.5007, -0.1246);
    /// assert_eq!(fix.coordinates.latitude, 51.5007);
    /// assert!(fix.horizontal_accuracy.is_none());
    /// ```
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            coordinates: Coordinates::new(latitude, longitude),
            horizontal_accuracy: None,
            timestamp: Utc::now(),
        }
    }

    /// Sets the horizontal accuracy of this fix.
    #[must_use]
    pub const fn with_accuracy(mut self, meters: f64) -> Self {
        self.horizontal_accuracy = Some(meters);
        self
    }

    /// Sets the timestamp of this fix.
    #[must_use]
    pub const fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Distance between two fixes in meters.
    #[must_use]
    pub fn distance_from(&self, other: &Self) -> f64 {
        self.coordinates.distance_to(&other.coordinates)
    }
}
