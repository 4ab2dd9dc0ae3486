//! Declarative distribution plans.
//!
//! A [`DistributionPlan`] names a root authority, the secrets to build and the
//! consumers to publish them to. Plans are JSON documents:
//!
//! ```json
//! {
//!   "version": "v1",
//!   "root": {
//!     "certificate": { "path": "ca-cert.pem" },
//!     "private_key": { "path": "ca-key.pem" }
//!   },
//!   "consumers": ["ingress", "app1"],
//!   "secrets": [
//!     {
//!       "kind": "issued",
//!       "name": "server_cert",
//!       "subject": { "organization": "Acme" },
//!       "usages": ["server_auth"],
//!       "validation": true
//!     },
//!     {
//!       "kind": "static",
//!       "name": "app1_cert",
//!       "private_key": { "path": "app1-key.pem" },
//!       "certificate_chain": { "path": "app1-cert.pem" }
//!     }
//!   ]
//! }
//! ```
//!
//! Relative paths resolve against the directory of the plan file when the plan is
//! loaded with [`DistributionPlan::from_path`], and against the working directory
//! otherwise.

mod error;

use crate::authority::{ExtendedKeyUsage, LeafIssuer, RootAuthority, Subject};
use crate::cert::{Certificate, PrivateKey};
use crate::constants::DEFAULT_VALIDITY_YEARS;
use crate::prelude::info;
use crate::secret::SecretBundle;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use error::PlanError;

/// Where PEM material comes from.
#[derive(Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PemSource {
    /// A file on disk.
    Path(PathBuf),
    /// The PEM text itself.
    Inline(String),
}

impl PemSource {
    fn read(&self, base_dir: Option<&Path>) -> Result<String, PlanError> {
        match self {
            Self::Inline(pem) => Ok(pem.clone()),
            Self::Path(path) => {
                let path = match base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path.clone(),
                };
                fs::read_to_string(&path).map_err(|source| PlanError::Io { path, source })
            }
        }
    }
}

impl fmt::Debug for PemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Inline(pem) => f
                .debug_struct("Inline")
                .field("len", &pem.len())
                .finish(),
        }
    }
}

/// The root authority material.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RootSpec {
    /// The CA certificate.
    pub certificate: PemSource,
    /// The CA private key, PKCS#8.
    pub private_key: PemSource,
}

/// One secret of the plan.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
#[non_exhaustive]
pub enum SecretSpec {
    /// A certificate secret for a freshly issued leaf.
    Issued {
        /// Secret name.
        name: String,
        /// Leaf subject.
        #[serde(default)]
        subject: Subject,
        /// Validity in whole years.
        #[serde(default = "default_validity_years")]
        validity_years: u32,
        /// Extended key usages.
        #[serde(default)]
        usages: Vec<ExtendedKeyUsage>,
        /// Also build `<name>_validation`, trusting the root and pinning the leaf.
        #[serde(default)]
        validation: bool,
    },
    /// A certificate secret from fixed PEM material.
    Static {
        /// Secret name.
        name: String,
        /// Private key PEM.
        private_key: PemSource,
        /// Certificate chain PEM, leaf first.
        certificate_chain: PemSource,
    },
    /// A validation-context secret.
    Validation {
        /// Secret name.
        name: String,
        /// Trust anchors; the root certificate when absent.
        #[serde(default)]
        trusted_ca: Option<PemSource>,
        /// Pinned SHA-256 fingerprints.
        #[serde(default)]
        pins: Vec<String>,
    },
}

impl SecretSpec {
    /// The secret name.
    pub fn name(&self) -> &str {
        match self {
            Self::Issued { name, .. } | Self::Static { name, .. } | Self::Validation { name, .. } => {
                name
            }
        }
    }
}

fn default_validity_years() -> u32 {
    DEFAULT_VALIDITY_YEARS
}

/// A root authority, a set of secrets and the consumers that receive them.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistributionPlan {
    /// Version tag of the snapshot.
    pub version: String,
    /// Root authority material.
    pub root: RootSpec,
    /// Consumer identities to publish to.
    #[serde(default)]
    pub consumers: Vec<String>,
    /// Secrets, in snapshot order.
    #[serde(default)]
    pub secrets: Vec<SecretSpec>,

    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl DistributionPlan {
    /// Parses a plan from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Parse`] on malformed JSON, unknown fields or unknown
    /// secret kinds.
    pub fn from_json_str(json: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a plan file. Relative PEM paths resolve against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Io`] if the file cannot be read, or [`PlanError::Parse`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut plan = Self::from_json_str(&json)?;
        plan.base_dir = path.parent().map(Path::to_path_buf);
        Ok(plan)
    }

    /// Loads the plan's root authority.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::Io`] or [`PlanError::Authority`].
    pub fn load_root(&self) -> Result<RootAuthority, PlanError> {
        let base_dir = self.base_dir.as_deref();
        let certificate = self.root.certificate.read(base_dir)?;
        let private_key = self.root.private_key.read(base_dir)?;
        Ok(RootAuthority::load(&certificate, &private_key)?)
    }

    /// Issues every leaf, builds every secret and assembles them into one snapshot.
    ///
    /// Nothing is published; a failure leaves no partial output.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlanError`] encountered.
    pub fn build_snapshot(&self) -> Result<Snapshot, PlanError> {
        let base_dir = self.base_dir.as_deref();
        let root = Arc::new(self.load_root()?);
        let issuer = LeafIssuer::new(Arc::clone(&root));

        let mut bundles = Vec::with_capacity(self.secrets.len());
        for spec in &self.secrets {
            match spec {
                SecretSpec::Issued {
                    name,
                    subject,
                    validity_years,
                    usages,
                    validation,
                } => {
                    let leaf = issuer
                        .issue(subject, *validity_years, usages)
                        .map_err(|source| PlanError::Issuance {
                            name: name.clone(),
                            source,
                        })?;
                    if *validation {
                        bundles.extend(SecretBundle::tls_certificate_with_validation(
                            name,
                            &leaf,
                            root.certificate_pem(),
                        ));
                    } else {
                        bundles.push(SecretBundle::tls_certificate(name.as_str(), &leaf));
                    }
                }
                SecretSpec::Static {
                    name,
                    private_key,
                    certificate_chain,
                } => {
                    let private_key = private_key.read(base_dir)?;
                    PrivateKey::check_pem(private_key.as_bytes()).map_err(|source| {
                        PlanError::PrivateKey {
                            name: name.clone(),
                            source,
                        }
                    })?;
                    let chain = certificate_chain.read(base_dir)?;
                    Certificate::chain_from_pem(chain.as_bytes()).map_err(|source| {
                        PlanError::Certificate {
                            name: name.clone(),
                            source,
                        }
                    })?;
                    bundles.push(SecretBundle::tls_certificate_from_pem(
                        name.as_str(),
                        private_key,
                        chain,
                    ));
                }
                SecretSpec::Validation {
                    name,
                    trusted_ca,
                    pins,
                } => {
                    let trusted_ca = match trusted_ca {
                        Some(source) => source.read(base_dir)?,
                        None => root.certificate_pem().to_owned(),
                    };
                    bundles.push(SecretBundle::validation_context(
                        name.as_str(),
                        trusted_ca,
                        pins.iter().cloned(),
                    ));
                }
            }
        }

        Ok(Snapshot::assemble(self.version.clone(), bundles)?)
    }

    /// Builds the snapshot and publishes it to every consumer of the plan, in order.
    ///
    /// Stops at the first rejected publish; consumers before it keep the new snapshot.
    ///
    /// # Errors
    ///
    /// Returns the first build or publish error.
    pub fn publish(&self, store: &SnapshotStore) -> Result<Snapshot, PlanError> {
        let snapshot = self.build_snapshot()?;
        for consumer in &self.consumers {
            store.publish(consumer, &snapshot)?;
        }
        info!(
            "plan {:?}: published {} secrets to {} consumers",
            snapshot.version(),
            snapshot.len(),
            self.consumers.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::Fingerprint;
    use crate::snapshot::SnapshotError;
    use serde_json::json;

    const CA_CERT: &str = include_str!("../../tests/testdata/ca-cert.pem");
    const CA_KEY: &str = include_str!("../../tests/testdata/ca-key.pem");
    const APP1_CERT: &str = include_str!("../../tests/testdata/app1-cert.pem");
    const APP1_KEY: &str = include_str!("../../tests/testdata/app1-key.pem");

    fn plan(secrets: serde_json::Value) -> DistributionPlan {
        let plan = json!({
            "version": "v1",
            "root": {
                "certificate": { "inline": CA_CERT },
                "private_key": { "inline": CA_KEY },
            },
            "consumers": ["ingress", "app1"],
            "secrets": secrets,
        });
        DistributionPlan::from_json_str(&plan.to_string()).unwrap()
    }

    #[test]
    fn test_parse_applies_defaults() {
        let plan = plan(json!([{ "kind": "issued", "name": "svc_cert" }]));

        assert_eq!(
            plan.secrets,
            vec![SecretSpec::Issued {
                name: "svc_cert".to_owned(),
                subject: Subject::default(),
                validity_years: 1,
                usages: Vec::new(),
                validation: false,
            }]
        );
    }

    #[test]
    fn test_parse_rejects_unknown_fields_and_kinds() {
        let unknown_field = r#"{"version":"v1","root":{"certificate":{"inline":""},"private_key":{"inline":""}},"extra":1}"#;
        assert!(matches!(
            DistributionPlan::from_json_str(unknown_field),
            Err(PlanError::Parse(_))
        ));

        let unknown_kind = json!({
            "version": "v1",
            "root": { "certificate": { "inline": "" }, "private_key": { "inline": "" } },
            "secrets": [{ "kind": "session_ticket", "name": "x" }],
        });
        assert!(matches!(
            DistributionPlan::from_json_str(&unknown_kind.to_string()),
            Err(PlanError::Parse(_))
        ));
    }

    #[test]
    fn test_build_issued_with_validation() {
        let plan = plan(json!([{
            "kind": "issued",
            "name": "server_cert",
            "subject": { "organization": "Acme" },
            "usages": ["server_auth"],
            "validation": true,
        }]));

        let snapshot = plan.build_snapshot().unwrap();

        assert_eq!(
            snapshot.names().collect::<Vec<_>>(),
            ["server_cert", "server_cert_validation"]
        );
        let leaf = snapshot
            .get("server_cert")
            .and_then(|s| s.as_tls_certificate())
            .unwrap();
        let validation = snapshot
            .get("server_cert_validation")
            .and_then(|s| s.as_validation_context())
            .unwrap();
        assert_eq!(validation.trusted_ca(), CA_CERT.as_bytes());
        assert_eq!(
            validation.verify_certificate_hash(),
            [leaf.leaf_fingerprint().unwrap().to_string()]
        );
        assert!(snapshot.unresolved_pins().is_empty());
    }

    #[test]
    fn test_build_static_and_validation() {
        let pin = Fingerprint::of_der(
            Certificate::chain_from_pem(APP1_CERT.as_bytes()).unwrap()[0].as_bytes(),
        )
        .to_string();
        let plan = plan(json!([
            {
                "kind": "static",
                "name": "app1_cert",
                "private_key": { "inline": APP1_KEY },
                "certificate_chain": { "inline": APP1_CERT },
            },
            { "kind": "validation", "name": "app1_validation", "pins": [pin] },
        ]));

        let snapshot = plan.build_snapshot().unwrap();

        let cert = snapshot
            .get("app1_cert")
            .and_then(|s| s.as_tls_certificate())
            .unwrap();
        assert_eq!(cert.certificate_chain(), APP1_CERT.as_bytes());
        let validation = snapshot
            .get("app1_validation")
            .and_then(|s| s.as_validation_context())
            .unwrap();
        assert_eq!(validation.trusted_ca(), CA_CERT.as_bytes());
    }

    #[test]
    fn test_build_rejects_bad_static_chain() {
        let plan = plan(json!([{
            "kind": "static",
            "name": "broken",
            "private_key": { "inline": APP1_KEY },
            "certificate_chain": { "inline": APP1_KEY },
        }]));

        assert!(matches!(
            plan.build_snapshot(),
            Err(PlanError::Certificate { name, .. }) if name == "broken"
        ));
    }

    #[test]
    fn test_build_rejects_bad_static_key() {
        let plan = plan(json!([{
            "kind": "static",
            "name": "swapped",
            "private_key": { "inline": APP1_CERT },
            "certificate_chain": { "inline": APP1_CERT },
        }]));

        assert!(matches!(
            plan.build_snapshot(),
            Err(PlanError::PrivateKey { name, .. }) if name == "swapped"
        ));
    }

    #[test]
    fn test_build_rejects_duplicate_names() {
        let plan = plan(json!([
            { "kind": "issued", "name": "svc_cert" },
            { "kind": "validation", "name": "svc_cert" },
        ]));

        assert!(matches!(
            plan.build_snapshot(),
            Err(PlanError::Snapshot(SnapshotError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn test_build_rejects_zero_validity() {
        let plan = plan(json!([
            { "kind": "issued", "name": "svc_cert", "validity_years": 0 },
        ]));

        assert!(matches!(
            plan.build_snapshot(),
            Err(PlanError::Issuance { name, .. }) if name == "svc_cert"
        ));
    }

    #[test]
    fn test_publish_to_every_consumer() {
        let store = SnapshotStore::new();
        let plan = plan(json!([{ "kind": "issued", "name": "svc_cert" }]));

        let snapshot = plan.publish(&store).unwrap();

        assert_eq!(store.consumers(), ["app1", "ingress"]);
        assert_eq!(*store.get("ingress").unwrap(), snapshot);
        assert_eq!(*store.get("app1").unwrap(), snapshot);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut plan = plan(json!([]));
        plan.root.certificate = PemSource::Path(PathBuf::from("/nonexistent/ca-cert.pem"));

        assert!(matches!(plan.load_root(), Err(PlanError::Io { .. })));
    }

    #[test]
    fn test_inline_source_debug_hides_content() {
        let source = PemSource::Inline(CA_KEY.to_owned());

        assert!(!format!("{source:?}").contains("PRIVATE KEY"));
    }
}
