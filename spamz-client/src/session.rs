//! A submit session with a last-result slot.
//!
//! Overlapping submits are neither deduplicated nor cancelled; the slot
//! holds whichever resolution finished last.

use parking_lot::Mutex;

use spamz_core::{Payload, Resolution};

use crate::resolver::Resolver;

/// Resolver plus the most recent result.
pub struct Session {
    resolver: Resolver,
    last: Mutex<Option<Resolution>>,
}

impl Session {
    /// Wrap a resolver.
    #[must_use]
    pub fn new(resolver: Resolver) -> Self {
        Self {
            resolver,
            last: Mutex::new(None),
        }
    }

    /// The wrapped resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve `payload` and remember the result.
    pub async fn submit(&self, payload: &Payload) -> Resolution {
        let resolution = self.resolver.resolve(payload).await;
        *self.last.lock() = Some(resolution.clone());
        resolution
    }

    /// The last completed resolution, if any.
    #[must_use]
    pub fn last_result(&self) -> Option<Resolution> {
        self.last.lock().clone()
    }

    /// Forget the last result.
    pub fn clear(&self) {
        *self.last.lock() = None;
    }
}
