//! Single-flight token: at most one transfer submission at a time.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Weight-1 semaphore. Dropping the permit releases the gate.
#[derive(Debug, Clone)]
pub struct DispatchGate {
    permits: Arc<Semaphore>,
}

impl DispatchGate {
    pub fn new() -> Self {
        Self { permits: Arc::new(Semaphore::new(1)) }
    }

    /// Take the gate if nobody holds it.
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.permits.clone().try_acquire_owned().ok()
    }

    /// Wait for the gate. `None` only once the gate has been closed.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.permits.clone().acquire_owned().await.ok()
    }

    pub fn is_held(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// Refuse all further acquisitions.
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for DispatchGate {
    fn default() -> Self {
        Self::new()
    }
}
