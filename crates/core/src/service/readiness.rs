//! Readiness gate for read operations.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{Mutex, MutexGuard};

use crate::Error;

/// Tracks whether a generation has ever been loaded or synced.
///
/// Reads are refused with [`Error::NotReady`] until [`ReadinessGate::mark_ready`]
/// has been called once. The flag never goes back to false.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
    init: Mutex<()>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail with `NotReady` unless a generation is being served.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_ready() { Ok(()) } else { Err(Error::NotReady) }
    }

    /// Serializes concurrent first-time initialization.
    pub(crate) async fn initializing(&self) -> MutexGuard<'_, ()> {
        self.init.lock().await
    }
}
