//! Output boundary of the tracker.

use super::error::{ProviderError, TrackerError};
use super::manager::LocationTracker;
use super::types::AuthorizationStatus;
use crate::location::Coordinates;

/// Observer for tracker events.
///
/// The tracker holds the delegate weakly: it never keeps it alive, and once
/// the host drops it callbacks are simply not delivered. Callbacks run with
/// no tracker lock held, so calling back into the tracker is allowed.
///
/// Only [`did_track_location`](Self::did_track_location) is required.
pub trait TrackerDelegate: Send + Sync {
    /// Permission status changed.
    fn authorization_did_change(&self, _status: AuthorizationStatus) {}

    /// The session could not start, or was ended by a permission change.
    fn did_fail_to_initialize(&self, _tracker: &LocationTracker, _error: &TrackerError) {}

    /// A new location was tracked.
    fn did_track_location(&self, tracker: &LocationTracker, coordinates: Coordinates);

    /// Tracking stopped because the provider failed.
    fn did_fail_to_track(&self, _tracker: &LocationTracker, _error: &ProviderError) {}
}
