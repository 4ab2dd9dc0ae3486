//! Snapshot assembly errors.

use crate::cert::error::FingerprintError;

/// An inconsistent resource set. No snapshot is produced when this is returned.
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
#[non_exhaustive]
pub enum SnapshotError {
    /// The snapshot version is empty.
    #[error("inconsistent snapshot: empty version")]
    EmptyVersion,

    /// A secret has an empty name.
    #[error("inconsistent snapshot {version:?}: secret #{index} has an empty name")]
    EmptyName {
        /// Snapshot version.
        version: String,
        /// Position of the secret in the assembled sequence.
        index: usize,
    },

    /// Two secrets share a name.
    #[error("inconsistent snapshot {version:?}: duplicate secret name {name:?}")]
    DuplicateName {
        /// Snapshot version.
        version: String,
        /// The repeated name.
        name: String,
    },

    /// A validation context pins a string that is not a SHA-256 fingerprint.
    #[error("inconsistent snapshot {version:?}: secret {name:?} pins malformed fingerprint {fingerprint:?}")]
    MalformedFingerprint {
        /// Snapshot version.
        version: String,
        /// Name of the validation-context secret.
        name: String,
        /// The rejected pin.
        fingerprint: String,
        /// Why the pin was rejected.
        #[source]
        source: FingerprintError,
    },
}
