//! Discovery-frontend lifecycle hooks.
//!
//! The frontend reports stream and fetch events through the [`Callbacks`] trait.
//! [`CallbackTracker`] is the stock implementation: it counts requests and fires a
//! one-shot [`ReadinessSignal`] on the first request of either kind.
//!
//! Trackers are plain values; hand each frontend its own instance, or share one
//! behind an `Arc`.

mod error;
mod readiness;
mod tracker;

use crate::discovery::{DiscoveryRequest, DiscoveryResponse, StreamId};

pub use error::ReadinessError;
pub use readiness::{Readiness, ReadinessSignal};
pub use tracker::{ActivityReport, CallbackTracker};

/// Hooks invoked by the discovery frontend.
///
/// Implementations are called concurrently from every active stream, and must not
/// block on I/O.
pub trait Callbacks: Send + Sync {
    /// Error returned by the fallible hooks; the frontend closes the stream on error.
    type Error: std::error::Error + Send + Sync + 'static;

    /// A stream was opened for `type_url` resources.
    fn on_stream_open(&self, stream_id: StreamId, type_url: &str) -> Result<(), Self::Error>;

    /// A stream was closed.
    fn on_stream_closed(&self, stream_id: StreamId);

    /// A request arrived on a stream.
    fn on_stream_request(
        &self,
        stream_id: StreamId,
        request: &DiscoveryRequest,
    ) -> Result<(), Self::Error>;

    /// A response is about to be sent on a stream.
    fn on_stream_response(
        &self,
        stream_id: StreamId,
        request: &DiscoveryRequest,
        response: &DiscoveryResponse,
    );

    /// A one-shot fetch request arrived.
    fn on_fetch_request(&self, request: &DiscoveryRequest) -> Result<(), Self::Error>;

    /// A one-shot fetch response is about to be sent.
    fn on_fetch_response(&self, request: &DiscoveryRequest, response: &DiscoveryResponse);
}
