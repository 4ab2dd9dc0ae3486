use super::readiness::{Readiness, ReadinessSignal};
use super::Callbacks;
use crate::discovery::{DiscoveryRequest, DiscoveryResponse, StreamId};
use crate::prelude::{debug, info};
use std::convert::Infallible;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Request counts reported by [`CallbackTracker::report`].
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct ActivityReport {
    /// One-shot fetch requests seen.
    pub fetches: u64,
    /// Stream requests seen.
    pub requests: u64,
}

impl fmt::Display for ActivityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetches={} requests={}", self.fetches, self.requests)
    }
}

/// Counts discovery requests and signals the first one.
///
/// Both counters sit behind one mutex, so [`report`](Self::report) never returns a
/// torn pair. The readiness signal is shared by the stream and fetch paths: whichever
/// request arrives first fires it.
pub struct CallbackTracker {
    counters: Mutex<ActivityReport>,
    signal: ReadinessSignal,
}

impl CallbackTracker {
    /// Creates a tracker with zeroed counters and an armed signal.
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(ActivityReport::default()),
            signal: ReadinessSignal::new(),
        }
    }

    /// Returns a handle that becomes ready on the first request.
    pub fn readiness(&self) -> Readiness {
        self.signal.subscribe()
    }

    /// Returns `true` once a request has been seen.
    pub fn is_ready(&self) -> bool {
        self.signal.is_fired()
    }

    /// Returns both counters, read under one lock acquisition, and logs them.
    pub fn report(&self) -> ActivityReport {
        let report = *self.lock();
        info!("server callbacks {}", report);
        report
    }

    fn record(&self, count: impl FnOnce(&mut ActivityReport)) -> bool {
        let mut counters = self.lock();
        count(&mut counters);
        self.signal.fire()
    }

    // Counters are plain integers; a poisoned lock still holds valid values.
    fn lock(&self) -> MutexGuard<'_, ActivityReport> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CallbackTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CallbackTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackTracker")
            .field("counters", &*self.lock())
            .field("signal", &self.signal)
            .finish()
    }
}

impl Callbacks for CallbackTracker {
    type Error = Infallible;

    fn on_stream_open(&self, stream_id: StreamId, type_url: &str) -> Result<(), Self::Error> {
        info!("stream {} open for {}", stream_id, type_url);
        Ok(())
    }

    fn on_stream_closed(&self, stream_id: StreamId) {
        info!("stream {} closed", stream_id);
    }

    fn on_stream_request(
        &self,
        stream_id: StreamId,
        request: &DiscoveryRequest,
    ) -> Result<(), Self::Error> {
        if self.record(|c| c.requests += 1) {
            info!(
                "first discovery request on stream {} (version {:?}); ready",
                stream_id, request.version_info
            );
        }
        Ok(())
    }

    fn on_stream_response(
        &self,
        stream_id: StreamId,
        _request: &DiscoveryRequest,
        response: &DiscoveryResponse,
    ) {
        debug!(
            "stream {} response version {:?} with {} resources",
            stream_id,
            response.version_info,
            response.resources.len()
        );
    }

    fn on_fetch_request(&self, request: &DiscoveryRequest) -> Result<(), Self::Error> {
        if self.record(|c| c.fetches += 1) {
            info!(
                "first fetch request (version {:?}); ready",
                request.version_info
            );
        }
        Ok(())
    }

    fn on_fetch_response(&self, _request: &DiscoveryRequest, response: &DiscoveryResponse) {
        debug!(
            "fetch response version {:?} with {} resources",
            response.version_info,
            response.resources.len()
        );
    }
}
