//! Mock server state
//!
//! Shared by all handlers behind an `Arc`.

use std::sync::Arc;
use std::time::Instant;

use crate::api::MemoryBackend;

#[derive(Clone)]
pub struct MockState {
    /// Backend serving every route
    pub backend: Arc<MemoryBackend>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl MockState {
    pub fn new(backend: Arc<MemoryBackend>) -> Self {
        Self {
            backend,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
