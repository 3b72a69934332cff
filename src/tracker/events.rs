//! Inbound event channel from the positioning provider.
//!
//! Platform callbacks may arrive on any thread. Adapters can either call
//! the `LocationTracker::did_*` methods directly, or push
//! [`ProviderEvent`]s into a channel that one task drains with
//! [`LocationTracker::drive`], which applies them strictly in order.
//!
//! ```ignore
//! let (sender, receiver) = fencetrack::tracker::event_channel();
//! let driver = tracker.clone();
//! tokio::spawn(async move { driver.drive(receiver).await });
//!
//! // From a platform callback:
//! let _ = sender.send(ProviderEvent::LocationsUpdated(fixes));
//! ```

use tokio::sync::mpsc;

use super::error::ProviderError;
use super::manager::LocationTracker;
use super::types::TrackedRegion;
use crate::location::LocationFix;

/// An event raised by the positioning provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// Permission or precision changed; read the new values from the provider.
    AuthorizationChanged,
    /// New fixes, oldest first.
    LocationsUpdated(Vec<LocationFix>),
    /// The device left a monitored region.
    RegionExited(TrackedRegion),
    /// Monitoring failed, for a specific region if the provider knows which.
    MonitoringFailed {
        /// The region that failed
        region: Option<TrackedRegion>,
        /// Why it failed
        error: ProviderError,
    },
    /// Location updates failed.
    LocationFailed(ProviderError),
}

/// Sending half of the provider event channel.
#[derive(Debug, Clone)]
pub struct ProviderEventSender {
    inner: mpsc::UnboundedSender<ProviderEvent>,
}

impl ProviderEventSender {
    /// Queues an event for the tracker.
    ///
    /// # Errors
    ///
    /// Hands the event back if the receiving side has been dropped.
    pub fn send(&self, event: ProviderEvent) -> Result<(), ProviderEvent> {
        self.inner.send(event).map_err(|err| err.0)
    }

    /// Returns true once the receiving side has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Receiving half of the provider event channel.
#[derive(Debug)]
pub struct ProviderEventReceiver {
    inner: mpsc::UnboundedReceiver<ProviderEvent>,
}

/// Creates a provider event channel.
#[must_use]
pub fn event_channel() -> (ProviderEventSender, ProviderEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        ProviderEventSender { inner: tx },
        ProviderEventReceiver { inner: rx },
    )
}

impl LocationTracker {
    /// Applies one provider event.
    pub fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AuthorizationChanged => self.did_change_authorization(),
            ProviderEvent::LocationsUpdated(fixes) => self.did_update_locations(&fixes),
            ProviderEvent::RegionExited(region) => self.did_exit_region(&region),
            ProviderEvent::MonitoringFailed { region, error } => {
                self.monitoring_did_fail(region.as_ref(), error);
            }
            ProviderEvent::LocationFailed(error) => self.did_fail_with_error(error),
        }
    }

    /// Drains `events` in order until every sender is dropped.
    ///
    /// Returns the number of events applied.
    pub async fn drive(&self, mut events: ProviderEventReceiver) -> usize {
        let mut applied = 0;
        while let Some(event) = events.inner.recv().await {
            self.handle_event(event);
            applied += 1;
        }
        log::debug!("Provider event channel closed after {applied} event(s)");
        applied
    }
}
