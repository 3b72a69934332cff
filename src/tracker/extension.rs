//! Single-slot bookkeeping for background extensions.
//!
//! At most one extension is outstanding per tracker. The slot moves
//! `Idle → Requesting → Active(handle) → Idle`; releasing is a `take`, so
//! whichever of normal finalization or expiration gets there first owns the
//! handle and the other sees nothing to release.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::provider::ExtensionHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Idle,
    /// Reserved while the environment is granting the extension.
    Requesting,
    Active(ExtensionHandle),
}

/// Tracks the outstanding background extension, if any.
#[derive(Debug)]
pub(crate) struct ExtensionGuard {
    slot: Mutex<Slot>,
}

impl ExtensionGuard {
    pub(crate) const fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the slot for a new extension. Returns false if one is
    /// already outstanding or being requested.
    pub(crate) fn try_reserve(&self) -> bool {
        let mut slot = self.slot();
        if *slot == Slot::Idle {
            *slot = Slot::Requesting;
            true
        } else {
            false
        }
    }

    /// Records the handle granted for a reservation.
    ///
    /// Returns the handle back if the slot was not reserved, in which case
    /// the caller must release it itself.
    pub(crate) fn activate(&self, handle: ExtensionHandle) -> Option<ExtensionHandle> {
        let mut slot = self.slot();
        if *slot == Slot::Requesting {
            *slot = Slot::Active(handle);
            None
        } else {
            Some(handle)
        }
    }

    /// Takes the active handle, leaving the slot idle.
    ///
    /// A reservation that has not been granted yet is left untouched.
    pub(crate) fn take(&self) -> Option<ExtensionHandle> {
        let mut slot = self.slot();
        match *slot {
            Slot::Active(handle) => {
                *slot = Slot::Idle;
                Some(handle)
            }
            Slot::Idle | Slot::Requesting => None,
        }
    }

    /// Returns true while an extension is being requested or is active.
    pub(crate) fn is_outstanding(&self) -> bool {
        *self.slot() != Slot::Idle
    }
}
