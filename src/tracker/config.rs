//! Tracker configuration.

use serde::{Deserialize, Serialize};

use super::error::{TrackerError, TrackerResult};

/// Default distance filter in meters.
pub const DEFAULT_DISTANCE_FILTER: f64 = 250.0;

/// Smallest distance filter that monitors reliably in the background.
///
/// Platforms enforce a minimum monitoring distance for regions. Smaller
/// filters still work in the foreground but exit events may arrive late or
/// not at all while backgrounded.
pub const BACKGROUND_RELIABLE_DISTANCE: f64 = 200.0;

/// Accuracy requested from the positioning provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DesiredAccuracy {
    /// Highest accuracy, with extra sensor fusion for navigation
    #[default]
    BestForNavigation,
    /// Highest accuracy the hardware offers
    Best,
    /// Within ten meters
    NearestTenMeters,
    /// Within a hundred meters
    HundredMeters,
    /// Within a kilometer
    Kilometer,
}

/// Kind of movement the provider should optimize for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActivityType {
    /// Unknown or mixed movement
    Other,
    /// Driving on roads
    #[default]
    AutomotiveNavigation,
    /// Walking, running, cycling
    Fitness,
    /// Boats, trains and other non-road navigation
    OtherNavigation,
    /// Flight
    Airborne,
}

/// Static tunables for a [`LocationTracker`](super::LocationTracker).
///
/// The distance filter is both the minimum movement between reported fixes
/// and the radius of the monitored region (clamped to the provider's
/// maximum).
///
/// # Example
///
/// ```
/// use fencetrack::tracker::TrackerConfiguration;
///
/// let config = TrackerConfiguration::new(300.0).unwrap();
/// assert!(config.is_background_reliable());
///
/// let json = config.to_json().unwrap();
/// let loaded = TrackerConfiguration::from_json(&json).unwrap();
/// assert_eq!(loaded, config);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfiguration {
    /// Minimum distance in meters at which tracking occurs
    pub distance_filter: f64,

    /// Accuracy requested during fix acquisition
    pub desired_accuracy: DesiredAccuracy,

    /// Movement profile hint
    pub activity_type: ActivityType,

    /// Whether the provider keeps delivering fixes in the background
    pub allows_background_updates: bool,
}

impl Default for TrackerConfiguration {
    fn default() -> Self {
        Self {
            distance_filter: DEFAULT_DISTANCE_FILTER,
            desired_accuracy: DesiredAccuracy::default(),
            activity_type: ActivityType::default(),
            allows_background_updates: true,
        }
    }
}

impl TrackerConfiguration {
    /// Creates a configuration with the given distance filter and defaults
    /// for everything else.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidConfiguration`] if the distance is not
    /// a finite positive number.
    pub fn new(distance_filter: f64) -> TrackerResult<Self> {
        let config = Self {
            distance_filter,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidConfiguration`] if the distance filter
    /// is zero, negative, or not finite.
    pub fn validate(&self) -> TrackerResult<()> {
        validate_distance_filter(self.distance_filter)
    }

    /// Returns true if the distance filter is large enough for reliable
    /// background monitoring.
    #[must_use]
    pub fn is_background_reliable(&self) -> bool {
        self.distance_filter >= BACKGROUND_RELIABLE_DISTANCE
    }

    /// Loads and validates a configuration from JSON.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_json(json: &str) -> TrackerResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this configuration to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> TrackerResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub(crate) fn validate_distance_filter(meters: f64) -> TrackerResult<()> {
    if meters.is_finite() && meters > 0.0 {
        Ok(())
    } else {
        Err(TrackerError::InvalidConfiguration(format!(
            "distance filter must be a positive number of meters, got {meters}"
        )))
    }
}
