use crate::authority::{AuthorityError, IssuanceError};
use crate::cert::error::{CertificateError, PrivateKeyError};
use crate::snapshot::SnapshotError;
use crate::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or executing a
/// [`DistributionPlan`](super::DistributionPlan).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlanError {
    /// A plan or PEM file could not be read.
    #[error("failed to read {path:?}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The plan is not valid JSON or does not match the plan schema.
    #[error("invalid distribution plan")]
    Parse(#[from] serde_json::Error),

    /// The root authority material was rejected.
    #[error("invalid root authority")]
    Authority(#[from] AuthorityError),

    /// Issuing the leaf for a secret failed.
    #[error("failed to issue certificate for secret {name:?}")]
    Issuance {
        /// The secret being built.
        name: String,
        /// The underlying issuance error.
        #[source]
        source: IssuanceError,
    },

    /// A static certificate chain is not valid PEM.
    #[error("invalid certificate chain for secret {name:?}")]
    Certificate {
        /// The secret being built.
        name: String,
        /// The underlying parse error.
        #[source]
        source: CertificateError,
    },

    /// A static private key is not a PEM private key.
    #[error("invalid private key for secret {name:?}")]
    PrivateKey {
        /// The secret being built.
        name: String,
        /// The underlying decode error.
        #[source]
        source: PrivateKeyError,
    },

    /// The assembled secrets are inconsistent.
    #[error("inconsistent snapshot")]
    Snapshot(#[from] SnapshotError),

    /// The store refused the snapshot.
    #[error("failed to publish snapshot")]
    Store(#[from] StoreError),
}
