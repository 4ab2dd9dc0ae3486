use crate::snapshot::SnapshotError;
use std::fmt;
use thiserror::Error;

/// Errors returned by [`SnapshotStore`](super::SnapshotStore).
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum StoreError {
    /// The snapshot was refused; the consumer's previous snapshot, if any, stays active.
    #[error("snapshot {version:?} rejected for consumer {consumer:?}: {reason}")]
    PublishRejected {
        /// Target consumer identity.
        consumer: String,
        /// Version of the refused snapshot.
        version: String,
        /// Why the snapshot was refused.
        #[source]
        reason: RejectReason,
    },

    /// No snapshot has been published for the consumer.
    #[error("no snapshot published for consumer {consumer:?}")]
    UnknownConsumer {
        /// The queried consumer identity.
        consumer: String,
    },

    /// A request asked for a resource type the store does not serve.
    #[error("consumer {consumer:?} requested unsupported resource type {type_url:?}")]
    UnsupportedResourceType {
        /// The requesting consumer identity.
        consumer: String,
        /// The requested type URL.
        type_url: String,
    },

    /// The store was dropped.
    #[error("snapshot store is closed")]
    Closed,
}

/// Why [`SnapshotStore::publish`](super::SnapshotStore::publish) refused a snapshot.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum RejectReason {
    /// The consumer identity is empty.
    #[error("consumer identity is empty")]
    EmptyConsumer,

    /// The snapshot failed the consistency check.
    #[error(transparent)]
    Inconsistent(#[from] SnapshotError),

    /// The snapshot exceeds a configured limit.
    #[error("resource limit exceeded: {kind} (limit={limit}, actual={actual})")]
    ResourceLimitExceeded {
        /// The kind of limit that was exceeded.
        kind: LimitKind,
        /// The configured limit value.
        limit: usize,
        /// The actual value that exceeded the limit.
        actual: usize,
    },
}

/// The kind of snapshot limit that was exceeded.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum LimitKind {
    /// Maximum number of secrets in a snapshot.
    MaxSecrets,
    /// Maximum inline bytes of one secret.
    MaxSecretBytes,
}

impl LimitKind {
    /// Returns a stable string representation of the limit kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaxSecrets => "max_secrets",
            Self::MaxSecretBytes => "max_secret_bytes",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
