//! Types shared between the tracker and its collaborators.

use serde::{Deserialize, Serialize};

use super::config::{ActivityType, DesiredAccuracy};
use crate::location::{region_identifier, Coordinates};

/// Tag prefixed to every region identifier the tracker creates.
pub const TRACKER_TAG: &str = "fencetrack";

/// Location permission granted to the host application.
///
/// `Unknown` carries a raw platform value the tracker does not recognize.
/// It is never treated as authorized and never reported as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    NotDetermined,
    /// The user refused access
    Denied,
    /// Access is blocked by policy (parental controls, MDM)
    Restricted,
    /// Access granted while the app is in use
    AuthorizedWhenInUse,
    /// Access granted at all times
    AuthorizedAlways,
    /// A status value introduced after this crate was written
    Unknown(i32),
}

impl AuthorizationStatus {
    /// Returns true for `AuthorizedWhenInUse` and `AuthorizedAlways`.
    #[must_use]
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }
}

impl std::fmt::Display for AuthorizationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotDetermined => f.write_str("notDetermined"),
            Self::Denied => f.write_str("denied"),
            Self::Restricted => f.write_str("restricted"),
            Self::AuthorizedWhenInUse => f.write_str("authorizedWhenInUse"),
            Self::AuthorizedAlways => f.write_str("authorizedAlways"),
            Self::Unknown(raw) => write!(f, "unknown({raw})"),
        }
    }
}

/// Precision dimension of the location permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AccuracyAuthorization {
    /// Exact positions are available
    #[default]
    Full,
    /// Only approximate positions are available; region monitoring breaks
    Reduced,
}

/// Lifecycle state of the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationState {
    /// In the foreground and receiving events
    Active,
    /// In the foreground but not receiving events (transitioning, interrupted)
    Inactive,
    /// Running in the background
    Background,
}

/// Kinds of region a provider may be able to monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// A circle around a center coordinate
    Circular,
}

/// The single circular trip-wire region the tracker monitors.
///
/// Entry notification is always off and exit notification always on: the
/// region is installed around the device, so only leaving it matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedRegion {
    /// Center of the region
    pub center: Coordinates,

    /// Radius in meters
    pub radius: f64,

    /// Deterministic identifier built from the center
    pub identifier: String,

    /// Whether entering the region raises an event
    pub notify_on_entry: bool,

    /// Whether leaving the region raises an event
    pub notify_on_exit: bool,
}

impl TrackedRegion {
    /// Creates an exit-only region around `center`.
    ///
    /// # Examples
    ///
    /// ```
    /// use fencetrack::location::Coordinates;
    /// use fencetrack::tracker::TrackedRegion;
    ///
    /// let region = TrackedRegion::exit_only(Coordinates::new(37.7749, -122.4194), 250.0);
    /// assert!(region.identifier.starts_with("fencetrack:"));
    /// assert!(!region.notify_on_entry);
    /// assert!(region.notify_on_exit);
    /// ```
    #[must_use]
    pub fn exit_only(center: Coordinates, radius: f64) -> Self {
        Self {
            center,
            radius,
            identifier: region_identifier(TRACKER_TAG, center),
            notify_on_entry: false,
            notify_on_exit: true,
        }
    }

    /// Returns the kind of this region.
    #[must_use]
    pub const fn kind(&self) -> RegionKind {
        RegionKind::Circular
    }

    /// Returns true if `other` denotes the same region.
    ///
    /// Providers identify regions by identifier, so a region echoed back in
    /// an event may differ in radius (providers round it) but not in id.
    #[must_use]
    pub fn is_same_region(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

/// Phase of the tracking state machine.
///
/// Continuous updates and region monitoring are mutually exclusive, so the
/// phase carries the live region when there is one.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingPhase {
    /// Nothing running
    Idle,
    /// Continuous location updates running, waiting for a fix
    AcquiringFix,
    /// Updates stopped, waiting for the device to leave this region
    Monitoring(TrackedRegion),
    /// A fix was reported but the platform cannot monitor regions
    Degraded,
}

impl TrackingPhase {
    /// Returns true while continuous updates are running.
    #[must_use]
    pub const fn is_updating(&self) -> bool {
        matches!(self, Self::AcquiringFix)
    }

    /// Returns the live region, if any.
    #[must_use]
    pub const fn region(&self) -> Option<&TrackedRegion> {
        match self {
            Self::Monitoring(region) => Some(region),
            _ => None,
        }
    }
}

/// Settings pushed to the provider before continuous updates start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdateSettings {
    /// Minimum movement in meters between delivered fixes
    pub distance_filter: f64,

    /// Requested accuracy of fixes
    pub desired_accuracy: DesiredAccuracy,

    /// Hint about the kind of movement being tracked
    pub activity_type: ActivityType,

    /// Whether the provider may keep delivering fixes in the background
    pub allows_background_updates: bool,
}
