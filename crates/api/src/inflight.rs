//! Duplicate-submission guard.
//!
//! An upload claims the SHA-256 digest of its image payload for as long as
//! it runs. A second submission of the same bytes while the first is still
//! in flight is refused instead of starting another pipeline run. The claim
//! is released when the returned [`InFlightGuard`] is dropped, which the
//! upload task does once its pipeline run has finished.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Set of payload digests with an upload in progress.
#[derive(Debug, Default)]
pub struct InFlightUploads {
    active: Mutex<HashSet<String>>,
}

impl InFlightUploads {
    /// Claim `digest`, or return `None` if it is already claimed.
    pub fn claim(self: &Arc<Self>, digest: String) -> Option<InFlightGuard> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(digest.clone()) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            digest,
        })
    }
}

/// Releases its digest on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightUploads>,
    digest: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.digest);
    }
}
