#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

//! Issues CA-signed TLS credentials and distributes them to discovery consumers as
//! versioned snapshots of secrets.
//!
//! The pieces compose bottom-up: a [`RootAuthority`] signs fresh leaves through a
//! [`LeafIssuer`], leaves are wrapped into named [`SecretBundle`]s, bundles are
//! grouped into an immutable, consistency-checked [`Snapshot`], and snapshots are
//! published per consumer into a [`SnapshotStore`]. A discovery frontend serves the
//! store and reports protocol activity to a [`CallbackTracker`].
//!
//! # Examples
//!
//! ```no_run
//! use chute::authority::{ExtendedKeyUsage, LeafIssuer, RootAuthority, Subject};
//! use chute::{CallbackTracker, SecretBundle, Snapshot, SnapshotStore};
//! use std::error::Error;
//! use std::sync::Arc;
//!
//! # fn run(ca_cert_pem: &str, ca_key_pem: &str) -> Result<(), Box<dyn Error>> {
//! // load the root authority from PEM material
//! let root = Arc::new(RootAuthority::load(ca_cert_pem, ca_key_pem)?);
//!
//! // issue a server leaf valid for one year
//! let issuer = LeafIssuer::new(Arc::clone(&root));
//! let subject = Subject::new().with_organization("Acme");
//! let leaf = issuer.issue(&subject, 1, &[ExtendedKeyUsage::ServerAuth])?;
//!
//! // wrap it into a secret and assemble a snapshot
//! let snapshot = Snapshot::assemble("v1", [SecretBundle::tls_certificate("svc_cert", &leaf)])?;
//!
//! // publish it to two consumers
//! let store = SnapshotStore::new();
//! store.publish("ingress", &snapshot)?;
//! store.publish("app1", &snapshot)?;
//! assert_eq!(store.get("ingress")?.version(), "v1");
//!
//! // hand the tracker to the discovery frontend and wait for the first request
//! let tracker = CallbackTracker::new();
//! let mut readiness = tracker.readiness();
//! # let _ = &mut readiness;
//! # Ok(())
//! # }
//! ```

pub mod authority;
pub mod callbacks;
pub mod cert;
pub mod constants;
pub mod discovery;
pub mod plan;
pub mod secret;
pub mod snapshot;
pub mod store;

mod observability;
mod prelude;

// -----------------------
// Re-exports
// -----------------------

/// Core types re-exported for simplified access.
pub use crate::{
    authority::{AuthorityError, IssuanceError, LeafCredential, LeafIssuer, RootAuthority},
    callbacks::{CallbackTracker, Callbacks, Readiness, ReadinessSignal},
    cert::{Certificate, Fingerprint, PrivateKey},
    plan::{DistributionPlan, PlanError},
    secret::SecretBundle,
    snapshot::{Snapshot, SnapshotError},
    store::{SnapshotStore, SnapshotStoreBuilder, StoreError},
};
