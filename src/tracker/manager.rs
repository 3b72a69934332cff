//! The tracking state machine.
//!
//! [`LocationTracker`] alternates between two mutually exclusive phases:
//!
//! ```text
//!            start_tracking (authorized)
//!   Idle ─────────────────────────────▶ AcquiringFix
//!    ▲                                    │ first fix
//!    │ stop_tracking / failure            ▼
//!    └──────────────────────────────── Monitoring(region)
//!                                         │ region exit
//!                     foreground: restart │ background: extension,
//!                     updates immediately │ restart, finalize
//!                                         ▼
//!                                    AcquiringFix
//! ```
//!
//! When a fix arrives the tracker reports it, stops continuous updates and
//! installs one exit-only region sized by the distance filter. Leaving that
//! region restarts fix acquisition.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use log::{debug, info, warn};

use super::config::{validate_distance_filter, TrackerConfiguration};
use super::delegate::TrackerDelegate;
use super::error::{ProviderError, TrackerError, TrackerResult};
use super::extension::ExtensionGuard;
use super::provider::{BackgroundExecution, ExpirationHandler, LocationProvider};
use super::types::{
    AccuracyAuthorization, AuthorizationStatus, TrackedRegion, TrackingPhase, UpdateSettings,
};
use crate::location::{Coordinates, LocationFix};

/// Something to tell the delegate once the state lock is released.
#[derive(Debug)]
enum Notification {
    AuthorizationChanged(AuthorizationStatus),
    FailedToInitialize(TrackerError),
    Tracked(Coordinates),
    FailedToTrack(ProviderError),
}

#[derive(Debug)]
struct TrackerState {
    configuration: TrackerConfiguration,
    phase: TrackingPhase,
    current_location: Option<LocationFix>,
}

struct TrackerInner {
    state: Mutex<TrackerState>,
    extension: ExtensionGuard,
    provider: Arc<dyn LocationProvider>,
    environment: Arc<dyn BackgroundExecution>,
    delegate: RwLock<Option<Weak<dyn TrackerDelegate>>>,
}

impl TrackerInner {
    fn state(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delegate(&self) -> Option<Arc<dyn TrackerDelegate>> {
        self.delegate
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }

    /// Checks permission, asking for it if it was never requested.
    ///
    /// Denied and restricted statuses queue an initialization failure.
    fn ensure_authorized(&self, notes: &mut Vec<Notification>) -> bool {
        let status = self.provider.authorization_status();
        match status {
            AuthorizationStatus::NotDetermined => {
                info!("Requesting location authorization");
                self.provider.request_always_authorization();
                false
            }
            AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                notes.push(Notification::FailedToInitialize(
                    TrackerError::AuthorizationFail(status),
                ));
                false
            }
            AuthorizationStatus::AuthorizedWhenInUse | AuthorizationStatus::AuthorizedAlways => {
                true
            }
            AuthorizationStatus::Unknown(raw) => {
                debug!("Ignoring unrecognized authorization status {raw}");
                false
            }
        }
    }

    fn start_tracking_locked(&self, state: &mut TrackerState, notes: &mut Vec<Notification>) {
        if let Some(region) = state.phase.region() {
            debug!("Already monitoring {}, start ignored", region.identifier);
            return;
        }
        if state.phase.is_updating() {
            debug!("Already acquiring a fix, start ignored");
            return;
        }

        if self.ensure_authorized(notes) {
            self.begin_updates(state);
        }
    }

    fn begin_updates(&self, state: &mut TrackerState) {
        let config = &state.configuration;
        self.provider.apply_settings(&UpdateSettings {
            distance_filter: config.distance_filter,
            desired_accuracy: config.desired_accuracy,
            activity_type: config.activity_type,
            allows_background_updates: config.allows_background_updates,
        });
        self.provider.start_updating_location();
        state.phase = TrackingPhase::AcquiringFix;
        debug!("Continuous location updates started");
    }

    fn stop_tracking_locked(&self, state: &mut TrackerState) {
        self.provider.stop_updating_location();

        let phase = std::mem::replace(&mut state.phase, TrackingPhase::Idle);
        if let TrackingPhase::Monitoring(region) = phase {
            // The provider may hold more than one copy of the same region.
            for monitored in self
                .provider
                .monitored_regions()
                .iter()
                .filter(|monitored| monitored.is_same_region(&region))
            {
                self.provider.stop_monitoring(monitored);
            }
            debug!("Stopped monitoring {}", region.identifier);
        }
    }

    fn restart_updating_locked(&self, state: &mut TrackerState) {
        self.stop_tracking_locked(state);
        self.begin_updates(state);
    }

    /// Reports `fix`, stops updates and puts a trip-wire region around it.
    fn install_region(
        &self,
        state: &mut TrackerState,
        fix: &LocationFix,
        notes: &mut Vec<Notification>,
    ) {
        self.provider.stop_updating_location();
        notes.push(Notification::Tracked(fix.coordinates));

        // Providers reject regions above their maximum radius.
        let radius = state
            .configuration
            .distance_filter
            .min(self.provider.maximum_region_monitoring_distance());
        let region = TrackedRegion::exit_only(fix.coordinates, radius);

        if self.provider.is_monitoring_available(region.kind()) {
            self.provider.start_monitoring(&region);
            debug!(
                "Monitoring {} (radius {radius} m) around {}",
                region.identifier, region.center
            );
            state.phase = TrackingPhase::Monitoring(region);
        } else {
            // TODO: fall back to significant-change updates once providers expose them.
            warn!("Region monitoring unavailable, tracking degraded after this fix");
            state.phase = TrackingPhase::Degraded;
        }
    }

    fn fail_to_initialize(
        &self,
        state: &mut TrackerState,
        error: TrackerError,
        notes: &mut Vec<Notification>,
    ) {
        warn!("Tracking session ended: {error}");
        self.stop_tracking_locked(state);
        notes.push(Notification::FailedToInitialize(error));
    }

    fn fail_to_track(
        &self,
        state: &mut TrackerState,
        error: ProviderError,
        notes: &mut Vec<Notification>,
    ) {
        warn!("Tracking failed: {error}");
        self.stop_tracking_locked(state);
        notes.push(Notification::FailedToTrack(error));
    }
}

impl Drop for TrackerInner {
    fn drop(&mut self) {
        let mut state = self.state();
        self.stop_tracking_locked(&mut state);
        drop(state);

        if let Some(handle) = self.extension.take() {
            self.environment.end_extension(handle);
        }
    }
}

/// Battery-efficient location tracker.
///
/// Clones share one tracking session. Dropping the last clone stops all
/// updates and monitoring and releases any outstanding background
/// extension.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use fencetrack::tracker::{LocationTracker, TrackerConfiguration};
///
/// let tracker = LocationTracker::new(TrackerConfiguration::default(), provider, environment);
/// tracker.set_delegate(&delegate);
/// tracker.start_tracking();
///
/// // Forward provider callbacks:
/// tracker.did_update_locations(&fixes);
/// tracker.did_exit_region(&region);
/// ```
#[derive(Clone)]
pub struct LocationTracker {
    inner: Arc<TrackerInner>,
}

impl std::fmt::Debug for LocationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state();
        f.debug_struct("LocationTracker")
            .field("configuration", &state.configuration)
            .field("phase", &state.phase)
            .field("current_location", &state.current_location)
            .field("extension_outstanding", &self.inner.extension.is_outstanding())
            .finish_non_exhaustive()
    }
}

impl LocationTracker {
    /// Creates an idle tracker.
    ///
    /// Nothing is started until [`start_tracking`](Self::start_tracking).
    pub fn new(
        configuration: TrackerConfiguration,
        provider: Arc<dyn LocationProvider>,
        environment: Arc<dyn BackgroundExecution>,
    ) -> Self {
        if !configuration.is_background_reliable() {
            warn!(
                "Distance filter {} m is below {} m, background monitoring may be unreliable",
                configuration.distance_filter,
                super::config::BACKGROUND_RELIABLE_DISTANCE
            );
        }

        Self {
            inner: Arc::new(TrackerInner {
                state: Mutex::new(TrackerState {
                    configuration,
                    phase: TrackingPhase::Idle,
                    current_location: None,
                }),
                extension: ExtensionGuard::new(),
                provider,
                environment,
                delegate: RwLock::new(None),
            }),
        }
    }

    /// Registers the delegate. The tracker keeps only a weak reference.
    pub fn set_delegate<D: TrackerDelegate + 'static>(&self, delegate: &Arc<D>) {
        let weak: Weak<D> = Arc::downgrade(delegate);
        let weak: Weak<dyn TrackerDelegate> = weak;
        *self
            .inner
            .delegate
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(weak);
    }

    /// Removes the delegate.
    pub fn clear_delegate(&self) {
        *self
            .inner
            .delegate
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    // ==================== Host Operations ====================

    /// Starts tracking.
    ///
    /// A no-op while a region is monitored or a fix is being acquired.
    /// Otherwise asks for permission if it was never requested, reports a
    /// failure if it was refused, or starts continuous updates.
    pub fn start_tracking(&self) {
        let mut notes = Vec::new();
        {
            let mut state = self.inner.state();
            self.inner.start_tracking_locked(&mut state, &mut notes);
        }
        self.dispatch(notes);
    }

    /// Stops continuous updates and removes the monitored region.
    ///
    /// Safe to call repeatedly and from inside delegate callbacks. The last
    /// known location is kept.
    pub fn stop_tracking(&self) {
        let mut state = self.inner.state();
        self.inner.stop_tracking_locked(&mut state);
    }

    /// Changes the distance filter. Takes effect on the next region or
    /// update start.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidConfiguration`] for a non-positive or
    /// non-finite distance.
    pub fn set_distance_filter(&self, meters: f64) -> TrackerResult<()> {
        validate_distance_filter(meters)?;
        self.inner.state().configuration.distance_filter = meters;
        Ok(())
    }

    // ==================== Accessors ====================

    /// Current permission status, read from the provider.
    #[must_use]
    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.inner.provider.authorization_status()
    }

    /// Current permission precision, read from the provider.
    #[must_use]
    pub fn accuracy_authorization(&self) -> AccuracyAuthorization {
        self.inner.provider.accuracy_authorization()
    }

    /// Returns true if the app may use location.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorization_status().is_authorized()
    }

    /// Coordinates of the last fix that installed a region.
    #[must_use]
    pub fn current_coordinates(&self) -> Option<Coordinates> {
        self.inner
            .state()
            .current_location
            .as_ref()
            .map(|fix| fix.coordinates)
    }

    /// The last fix that installed a region.
    #[must_use]
    pub fn current_location(&self) -> Option<LocationFix> {
        self.inner.state().current_location.clone()
    }

    /// The monitored region, if any.
    #[must_use]
    pub fn current_region(&self) -> Option<TrackedRegion> {
        self.inner.state().phase.region().cloned()
    }

    /// Current phase of the state machine.
    #[must_use]
    pub fn phase(&self) -> TrackingPhase {
        self.inner.state().phase.clone()
    }

    /// A copy of the active configuration.
    #[must_use]
    pub fn configuration(&self) -> TrackerConfiguration {
        self.inner.state().configuration.clone()
    }

    /// Returns true while a background extension is held.
    #[must_use]
    pub fn is_extension_outstanding(&self) -> bool {
        self.inner.extension.is_outstanding()
    }

    // ==================== Provider Events ====================

    /// Handles an authorization change.
    ///
    /// Revoked permission or reduced precision end the session; otherwise
    /// tracking (re)starts.
    pub fn did_change_authorization(&self) {
        let status = self.inner.provider.authorization_status();
        info!("Location authorization changed to {status}");

        let mut notes = vec![Notification::AuthorizationChanged(status)];
        {
            let mut state = self.inner.state();
            if !status.is_authorized() {
                self.inner.fail_to_initialize(
                    &mut state,
                    TrackerError::AuthorizationFail(status),
                    &mut notes,
                );
            } else if self.inner.provider.accuracy_authorization()
                == AccuracyAuthorization::Reduced
            {
                self.inner
                    .fail_to_initialize(&mut state, TrackerError::ReducedPrecision, &mut notes);
            } else {
                self.inner.start_tracking_locked(&mut state, &mut notes);
            }
        }
        self.dispatch(notes);
    }

    /// Handles a batch of fixes; the most recent one wins.
    ///
    /// Batches arriving while no fix is being acquired (a region is already
    /// live, or tracking was stopped) are ignored.
    pub fn did_update_locations(&self, fixes: &[LocationFix]) {
        let mut notes = Vec::new();
        {
            let mut state = self.inner.state();
            if !state.phase.is_updating() {
                debug!("Ignoring {} fix(es) outside fix acquisition", fixes.len());
                return;
            }
            let Some(latest) = fixes.last() else {
                return;
            };

            state.current_location = Some(latest.clone());
            self.inner.install_region(&mut state, latest, &mut notes);
        }
        self.dispatch(notes);
    }

    /// Handles the device leaving a monitored region.
    ///
    /// In the foreground updates restart immediately. In the background a
    /// time-boxed extension is taken first, updates restart, and the
    /// provider's last known location is reported if it moved further than
    /// the distance filter. Exits for other regions are ignored, as are
    /// background exits while an extension is already outstanding.
    pub fn did_exit_region(&self, region: &TrackedRegion) {
        {
            let mut state = self.inner.state();
            match state.phase.region() {
                Some(current) if current.is_same_region(region) => {}
                _ => {
                    debug!("Ignoring exit from stale region {}", region.identifier);
                    return;
                }
            }

            if self.inner.environment.is_foregrounded() {
                debug!("Left {} in foreground, restarting updates", region.identifier);
                self.inner.restart_updating_locked(&mut state);
                return;
            }

            if !self.inner.extension.try_reserve() {
                debug!("Background extension already outstanding, exit ignored");
                return;
            }
        }

        // The environment may run the expiration handler synchronously, so
        // no lock is held while the extension is requested.
        let weak = Arc::downgrade(&self.inner);
        let on_expire: ExpirationHandler = Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                info!("Background extension expired");
                let tracker = Self { inner };
                let latest = tracker.inner.provider.last_location();
                tracker.finish_background_task(latest.as_ref());
            }
        });
        let handle = self.inner.environment.begin_extension(on_expire);
        if let Some(unclaimed) = self.inner.extension.activate(handle) {
            self.inner.environment.end_extension(unclaimed);
        }
        info!("Background extension {} started", handle.raw());

        {
            let mut state = self.inner.state();
            // A stop while the extension was requested wins over the restart.
            let still_live = state
                .phase
                .region()
                .is_some_and(|current| current.is_same_region(region));
            if still_live {
                self.inner.restart_updating_locked(&mut state);
            } else {
                debug!("Tracking changed during extension request, not restarting");
            }
        }

        // Finalizes with the best-known location without waiting for the
        // fresh fix the restarted updates will produce.
        let latest = self.inner.provider.last_location();
        self.finish_background_task(latest.as_ref());
    }

    /// Handles a region monitoring failure.
    ///
    /// Failures for the live region end the session, as does a failure
    /// naming no region while none is live.
    pub fn monitoring_did_fail(&self, region: Option<&TrackedRegion>, error: ProviderError) {
        let mut notes = Vec::new();
        {
            let mut state = self.inner.state();
            let is_current = match (state.phase.region(), region) {
                (Some(current), Some(failed)) => current.is_same_region(failed),
                (None, None) => true,
                _ => false,
            };
            if !is_current {
                debug!("Ignoring monitoring failure for a region that is not live: {error}");
                return;
            }
            self.inner.fail_to_track(&mut state, error, &mut notes);
        }
        self.dispatch(notes);
    }

    /// Handles a location failure. Transient "location unknown" failures
    /// are ignored because the provider keeps retrying.
    pub fn did_fail_with_error(&self, error: ProviderError) {
        if error.is_transient() {
            debug!("Ignoring transient provider error: {error}");
            return;
        }

        let mut notes = Vec::new();
        {
            let mut state = self.inner.state();
            self.inner.fail_to_track(&mut state, error, &mut notes);
        }
        self.dispatch(notes);
    }

    // ==================== Internals ====================

    /// Releases the background extension, first reporting `latest` if it is
    /// further than the distance filter from the current location.
    ///
    /// Only the caller that takes the handle reports, so racing expiration
    /// and normal completion report and release at most once.
    fn finish_background_task(&self, latest: Option<&LocationFix>) {
        let Some(handle) = self.inner.extension.take() else {
            return;
        };

        let report = {
            let state = self.inner.state();
            match (latest, state.current_location.as_ref()) {
                (Some(latest), Some(current))
                    if current.distance_from(latest) > state.configuration.distance_filter =>
                {
                    Some(latest.coordinates)
                }
                _ => None,
            }
        };
        if let Some(coordinates) = report {
            self.dispatch(vec![Notification::Tracked(coordinates)]);
        }

        self.inner.environment.end_extension(handle);
        info!("Background extension {} finished", handle.raw());
    }

    fn dispatch(&self, notes: Vec<Notification>) {
        if notes.is_empty() {
            return;
        }
        let Some(delegate) = self.inner.delegate() else {
            return;
        };

        for note in notes {
            match note {
                Notification::AuthorizationChanged(status) => {
                    delegate.authorization_did_change(status);
                }
                Notification::FailedToInitialize(error) => {
                    delegate.did_fail_to_initialize(self, &error);
                }
                Notification::Tracked(coordinates) => {
                    delegate.did_track_location(self, coordinates);
                }
                Notification::FailedToTrack(error) => {
                    delegate.did_fail_to_track(self, &error);
                }
            }
        }
    }
}
