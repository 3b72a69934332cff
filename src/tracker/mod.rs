//! Region-monitoring location tracker.
//!
//! Instead of polling GPS continuously, the tracker takes one fix, puts a
//! virtual geofence of the configured radius around it and goes dormant
//! until the device leaves the fence. Then it takes a fresh fix and repeats.
//!
//! # Architecture
//!
//! ```text
//! Host app ──start/stop──▶ LocationTracker ──callbacks──▶ TrackerDelegate
//!                            │        ▲
//!                  commands  │        │ ProviderEvent / did_* calls
//!                            ▼        │
//!                     LocationProvider (GPS + geofencing)
//!                     BackgroundExecution (extensions, app state)
//! ```
//!
//! # Guarantees
//!
//! - Continuous updates and region monitoring never run at the same time
//! - At most one region is monitored
//! - At most one background extension is outstanding, and it is released
//!   exactly once even when expiration races normal completion
//! - Delegate callbacks run without any tracker lock held
//!
//! # Platform Notes
//!
//! Distance filters below 200 m work in the foreground but are unreliable
//! in the background because platforms enforce a minimum monitoring
//! distance. Region monitoring also needs full-precision permission; with
//! reduced precision the session fails with
//! [`TrackerError::ReducedPrecision`].

mod config;
mod delegate;
mod error;
mod events;
mod extension;
mod manager;
mod provider;
mod types;

pub use config::{
    ActivityType, DesiredAccuracy, TrackerConfiguration, BACKGROUND_RELIABLE_DISTANCE,
    DEFAULT_DISTANCE_FILTER,
};
pub use delegate::TrackerDelegate;
pub use error::{ProviderError, ProviderErrorCode, TrackerError, TrackerResult};
pub use events::{event_channel, ProviderEvent, ProviderEventReceiver, ProviderEventSender};
pub use manager::LocationTracker;
pub use provider::{BackgroundExecution, ExpirationHandler, ExtensionHandle, LocationProvider};
pub use types::{
    AccuracyAuthorization, ApplicationState, AuthorizationStatus, RegionKind, TrackedRegion,
    TrackingPhase, UpdateSettings, TRACKER_TAG,
};
