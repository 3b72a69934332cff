//! Reusable test doubles for tracker integration tests.
//!
//! - [`MockProvider`] records every command and flags any moment where
//!   continuous updates and region monitoring would overlap.
//! - [`MockBackground`] hands out extensions and keeps their expiration
//!   handlers so tests can fire them on demand.
//! - [`RecordingDelegate`] records every callback in order.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use fencetrack::location::{Coordinates, LocationFix};
use fencetrack::tracker::{
    AccuracyAuthorization, ApplicationState, AuthorizationStatus, BackgroundExecution,
    ExpirationHandler, ExtensionHandle, LocationProvider, LocationTracker, ProviderError,
    ProviderErrorCode, RegionKind, TrackedRegion, TrackerConfiguration, TrackerDelegate,
    TrackerError, UpdateSettings,
};

/// Observable state of the mock provider.
#[derive(Debug, Clone)]
pub struct ProviderState {
    pub status: AuthorizationStatus,
    pub accuracy: AccuracyAuthorization,
    pub updating: bool,
    pub update_starts: usize,
    pub update_stops: usize,
    pub authorization_requests: usize,
    pub monitored: Vec<TrackedRegion>,
    pub monitoring_starts: usize,
    pub max_distance: f64,
    pub monitoring_available: bool,
    pub last_location: Option<LocationFix>,
    pub applied_settings: Vec<UpdateSettings>,
    /// Times updates and monitoring were active together.
    pub overlaps: usize,
}

/// Positioning provider double.
pub struct MockProvider {
    state: Mutex<ProviderState>,
}

impl MockProvider {
    pub fn new(status: AuthorizationStatus) -> Self {
        Self {
            state: Mutex::new(ProviderState {
                status,
                accuracy: AccuracyAuthorization::Full,
                updating: false,
                update_starts: 0,
                update_stops: 0,
                authorization_requests: 0,
                monitored: Vec::new(),
                monitoring_starts: 0,
                max_distance: 10_000.0,
                monitoring_available: true,
                last_location: None,
                applied_settings: Vec::new(),
                overlaps: 0,
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, ProviderState> {
        self.state.lock().unwrap()
    }

    pub fn snapshot(&self) -> ProviderState {
        self.state().clone()
    }

    pub fn set_status(&self, status: AuthorizationStatus) {
        self.state().status = status;
    }

    pub fn set_accuracy(&self, accuracy: AccuracyAuthorization) {
        self.state().accuracy = accuracy;
    }

    pub fn set_last_location(&self, fix: Option<LocationFix>) {
        self.state().last_location = fix;
    }

    pub fn set_max_distance(&self, meters: f64) {
        self.state().max_distance = meters;
    }

    pub fn set_monitoring_available(&self, available: bool) {
        self.state().monitoring_available = available;
    }

    /// Adds a provider-side copy of `region` (as platforms sometimes keep).
    pub fn duplicate_monitored(&self, region: &TrackedRegion) {
        self.state().monitored.push(region.clone());
    }
}

impl LocationProvider for MockProvider {
    fn authorization_status(&self) -> AuthorizationStatus {
        self.state().status
    }

    fn accuracy_authorization(&self) -> AccuracyAuthorization {
        self.state().accuracy
    }

    fn request_always_authorization(&self) {
        self.state().authorization_requests += 1;
    }

    fn apply_settings(&self, settings: &UpdateSettings) {
        self.state().applied_settings.push(*settings);
    }

    fn start_updating_location(&self) {
        let mut state = self.state();
        if !state.monitored.is_empty() {
            state.overlaps += 1;
        }
        state.updating = true;
        state.update_starts += 1;
    }

    fn stop_updating_location(&self) {
        let mut state = self.state();
        state.updating = false;
        state.update_stops += 1;
    }

    fn start_monitoring(&self, region: &TrackedRegion) {
        let mut state = self.state();
        if state.updating {
            state.overlaps += 1;
        }
        state.monitored.push(region.clone());
        state.monitoring_starts += 1;
    }

    fn stop_monitoring(&self, region: &TrackedRegion) {
        let mut state = self.state();
        if let Some(index) = state
            .monitored
            .iter()
            .position(|monitored| monitored.identifier == region.identifier)
        {
            state.monitored.remove(index);
        }
    }

    fn monitored_regions(&self) -> Vec<TrackedRegion> {
        self.state().monitored.clone()
    }

    fn maximum_region_monitoring_distance(&self) -> f64 {
        self.state().max_distance
    }

    fn is_monitoring_available(&self, _kind: RegionKind) -> bool {
        self.state().monitoring_available
    }

    fn last_location(&self) -> Option<LocationFix> {
        self.state().last_location.clone()
    }
}

/// Background execution double.
pub struct MockBackground {
    app_state: Mutex<ApplicationState>,
    next_id: Mutex<u64>,
    begun: Mutex<Vec<ExtensionHandle>>,
    ended: Mutex<Vec<ExtensionHandle>>,
    pending: Mutex<Vec<ExpirationHandler>>,
    expire_on_begin: Mutex<bool>,
    expire_on_thread: Mutex<bool>,
    expirations: Mutex<Vec<JoinHandle<()>>>,
    on_begin: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl MockBackground {
    pub fn new(app_state: ApplicationState) -> Self {
        Self {
            app_state: Mutex::new(app_state),
            next_id: Mutex::new(1),
            begun: Mutex::new(Vec::new()),
            ended: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            expire_on_begin: Mutex::new(false),
            expire_on_thread: Mutex::new(false),
            expirations: Mutex::new(Vec::new()),
            on_begin: Mutex::new(None),
        }
    }

    pub fn set_app_state(&self, state: ApplicationState) {
        *self.app_state.lock().unwrap() = state;
    }

    /// Makes `begin_extension` run the expiration handler before returning.
    pub fn expire_on_begin(&self, enabled: bool) {
        *self.expire_on_begin.lock().unwrap() = enabled;
    }

    /// Makes `begin_extension` hand the expiration handler to a new thread,
    /// so it runs while the tracker is still finishing the exit.
    pub fn expire_on_thread(&self, enabled: bool) {
        *self.expire_on_thread.lock().unwrap() = enabled;
    }

    /// Waits for every expiration thread started by `begin_extension`.
    pub fn join_expirations(&self) {
        let threads: Vec<_> = self.expirations.lock().unwrap().drain(..).collect();
        for thread in threads {
            thread.join().unwrap();
        }
    }

    /// Runs `hook` inside the next `begin_extension` call, before the
    /// handle is returned.
    pub fn on_next_begin(&self, hook: impl FnOnce() + Send + 'static) {
        *self.on_begin.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn begun(&self) -> Vec<ExtensionHandle> {
        self.begun.lock().unwrap().clone()
    }

    pub fn ended(&self) -> Vec<ExtensionHandle> {
        self.ended.lock().unwrap().clone()
    }

    /// Runs every stored expiration handler. Returns how many ran.
    pub fn expire_all(&self) -> usize {
        let handlers: Vec<ExpirationHandler> = self.pending.lock().unwrap().drain(..).collect();
        let count = handlers.len();
        for handler in handlers {
            handler();
        }
        count
    }

    /// Removes and returns the stored expiration handlers.
    pub fn take_handlers(&self) -> Vec<ExpirationHandler> {
        self.pending.lock().unwrap().drain(..).collect()
    }
}

impl BackgroundExecution for MockBackground {
    fn begin_extension(&self, on_expire: ExpirationHandler) -> ExtensionHandle {
        let handle = {
            let mut next = self.next_id.lock().unwrap();
            let handle = ExtensionHandle::new(*next);
            *next += 1;
            handle
        };
        self.begun.lock().unwrap().push(handle);

        let hook = self.on_begin.lock().unwrap().take();
        if let Some(hook) = hook {
            hook();
        }

        let expire_now = *self.expire_on_begin.lock().unwrap();
        let expire_on_thread = *self.expire_on_thread.lock().unwrap();
        if expire_now {
            on_expire();
        } else if expire_on_thread {
            self.expirations.lock().unwrap().push(thread::spawn(on_expire));
        } else {
            self.pending.lock().unwrap().push(on_expire);
        }
        handle
    }

    fn end_extension(&self, handle: ExtensionHandle) {
        self.ended.lock().unwrap().push(handle);
    }

    fn application_state(&self) -> ApplicationState {
        *self.app_state.lock().unwrap()
    }
}

/// Simplified initialization failure for assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitFailure {
    Authorization(AuthorizationStatus),
    ReducedPrecision,
    Other,
}

/// One recorded delegate callback.
#[derive(Debug, Clone, PartialEq)]
pub enum DelegateCall {
    AuthorizationChanged(AuthorizationStatus),
    FailedToInitialize(InitFailure),
    Tracked(Coordinates),
    FailedToTrack(ProviderErrorCode),
}

/// Delegate double that records callbacks.
#[derive(Default)]
pub struct RecordingDelegate {
    calls: Mutex<Vec<DelegateCall>>,
    stop_on_track: Mutex<bool>,
}

impl RecordingDelegate {
    pub fn calls(&self) -> Vec<DelegateCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn tracked(&self) -> Vec<Coordinates> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DelegateCall::Tracked(coordinates) => Some(coordinates),
                _ => None,
            })
            .collect()
    }

    /// Makes the delegate call `stop_tracking` from inside `did_track_location`.
    pub fn stop_on_track(&self, enabled: bool) {
        *self.stop_on_track.lock().unwrap() = enabled;
    }

    fn record(&self, call: DelegateCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TrackerDelegate for RecordingDelegate {
    fn authorization_did_change(&self, status: AuthorizationStatus) {
        self.record(DelegateCall::AuthorizationChanged(status));
    }

    fn did_fail_to_initialize(&self, _tracker: &LocationTracker, error: &TrackerError) {
        let failure = match error {
            TrackerError::AuthorizationFail(status) => InitFailure::Authorization(*status),
            TrackerError::ReducedPrecision => InitFailure::ReducedPrecision,
            _ => InitFailure::Other,
        };
        self.record(DelegateCall::FailedToInitialize(failure));
    }

    fn did_track_location(&self, tracker: &LocationTracker, coordinates: Coordinates) {
        self.record(DelegateCall::Tracked(coordinates));
        if *self.stop_on_track.lock().unwrap() {
            tracker.stop_tracking();
        }
    }

    fn did_fail_to_track(&self, _tracker: &LocationTracker, error: &ProviderError) {
        self.record(DelegateCall::FailedToTrack(error.code));
    }
}

/// A tracker wired to fresh doubles.
pub struct Harness {
    pub provider: Arc<MockProvider>,
    pub background: Arc<MockBackground>,
    pub delegate: Arc<RecordingDelegate>,
    pub tracker: LocationTracker,
}

impl Harness {
    /// Foreground tracker with the given status and distance filter.
    pub fn new(status: AuthorizationStatus, distance_filter: f64) -> Self {
        let provider = Arc::new(MockProvider::new(status));
        let background = Arc::new(MockBackground::new(ApplicationState::Active));
        let delegate = Arc::new(RecordingDelegate::default());

        let config = TrackerConfiguration::new(distance_filter).expect("valid distance filter");
        let tracker = LocationTracker::new(
            config,
            Arc::clone(&provider) as Arc<dyn LocationProvider>,
            Arc::clone(&background) as Arc<dyn BackgroundExecution>,
        );
        tracker.set_delegate(&delegate);

        Self {
            provider,
            background,
            delegate,
            tracker,
        }
    }

    /// Authorized tracker that has taken a first fix at `(lat, lon)` and is
    /// monitoring the region around it.
    pub fn monitoring_at(distance_filter: f64, lat: f64, lon: f64) -> Self {
        let harness = Self::new(AuthorizationStatus::AuthorizedAlways, distance_filter);
        harness.tracker.start_tracking();
        harness
            .tracker
            .did_update_locations(&[LocationFix::new(lat, lon)]);
        assert!(harness.tracker.current_region().is_some());
        harness
    }

    /// The live region; panics if none.
    pub fn region(&self) -> TrackedRegion {
        self.tracker.current_region().expect("a live region")
    }
}

/// Latitude offset that moves roughly `meters` north.
pub fn north_of(lat: f64, meters: f64) -> f64 {
    lat + meters / 111_195.0
}
