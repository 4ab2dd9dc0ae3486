use thiserror::Error;

/// Errors returned while waiting on a [`Readiness`](super::Readiness).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReadinessError {
    /// The signal was dropped without ever firing.
    #[error("readiness signal dropped before firing")]
    Closed,
}
