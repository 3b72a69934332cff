//! Capability interfaces the tracker consumes.
//!
//! The tracker never talks to platform APIs directly. A host wires in:
//!
//! - a [`LocationProvider`] that owns GPS and geofencing, and
//! - a [`BackgroundExecution`] environment that grants time-boxed
//!   background extensions and reports the application state.
//!
//! Events raised by the provider (fixes, region exits, failures,
//! authorization changes) travel back through
//! [`ProviderEvent`](super::ProviderEvent) or the matching
//! `LocationTracker::did_*` methods.

use super::types::{
    AccuracyAuthorization, ApplicationState, AuthorizationStatus, RegionKind, TrackedRegion,
    UpdateSettings,
};
use crate::location::LocationFix;

/// Positioning and geofencing capability provider.
///
/// Commands must not block and must not call back into the tracker
/// synchronously; results are delivered later as events.
pub trait LocationProvider: Send + Sync {
    /// Current permission status.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Current precision of the permission.
    fn accuracy_authorization(&self) -> AccuracyAuthorization;

    /// Asks the user for "always" permission. The answer arrives as an
    /// authorization-changed event.
    fn request_always_authorization(&self);

    /// Applies fix acquisition settings.
    fn apply_settings(&self, settings: &UpdateSettings);

    /// Starts continuous location updates.
    fn start_updating_location(&self);

    /// Stops continuous location updates. Safe to call when not updating.
    fn stop_updating_location(&self);

    /// Starts monitoring `region`.
    fn start_monitoring(&self, region: &TrackedRegion);

    /// Stops monitoring `region`.
    fn stop_monitoring(&self, region: &TrackedRegion);

    /// Every region the provider is currently monitoring for this app.
    fn monitored_regions(&self) -> Vec<TrackedRegion>;

    /// Largest radius in meters the provider accepts for a region.
    fn maximum_region_monitoring_distance(&self) -> f64;

    /// Whether regions of this kind can be monitored on this device.
    fn is_monitoring_available(&self, kind: RegionKind) -> bool;

    /// The most recent fix the provider knows about, if any.
    fn last_location(&self) -> Option<LocationFix>;
}

/// Opaque token for a granted background extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionHandle(u64);

impl ExtensionHandle {
    /// Wraps a platform task identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the platform task identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Callback run by the environment when an extension's budget runs out.
///
/// May be invoked from any thread, at most once.
pub type ExpirationHandler = Box<dyn FnOnce() + Send + 'static>;

/// Host background-execution environment.
pub trait BackgroundExecution: Send + Sync {
    /// Requests a time-boxed background extension.
    fn begin_extension(&self, on_expire: ExpirationHandler) -> ExtensionHandle;

    /// Releases an extension obtained from [`begin_extension`](Self::begin_extension).
    fn end_extension(&self, handle: ExtensionHandle);

    /// Current lifecycle state of the host application.
    fn application_state(&self) -> ApplicationState;

    /// Returns true only when the application is active in the foreground.
    fn is_foregrounded(&self) -> bool {
        self.application_state() == ApplicationState::Active
    }
}
