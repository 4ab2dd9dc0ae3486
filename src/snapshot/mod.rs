//! Immutable, versioned sets of secrets.
//!
//! A [`Snapshot`] can only be obtained through [`Snapshot::assemble`], which
//! validates the resource set first. The check is deliberately shallow: pins
//! must be well-formed SHA-256 fingerprints, but need not match a certificate
//! of the same snapshot, since pinned peers may be distributed out of band.
//! [`Snapshot::unresolved_pins`] lists such pins for diagnostics.

use crate::cert::Fingerprint;
use crate::constants::SECRET_TYPE_URL;
use crate::prelude::debug;
use crate::secret::SecretBundle;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

mod error;

pub use error::SnapshotError;

/// A version-tagged, internally consistent collection of secrets.
///
/// Cloning is cheap: the secrets are shared.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Snapshot {
    version: String,
    secrets: Arc<[SecretBundle]>,
}

/// A pin with no matching certificate secret in the same snapshot.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct UnresolvedPin<'a> {
    /// Name of the validation-context secret holding the pin.
    pub secret: &'a str,
    /// The pinned fingerprint, as given.
    pub fingerprint: &'a str,
}

impl Snapshot {
    /// Groups `bundles` into a snapshot tagged `version`.
    ///
    /// The bundles are copied into the snapshot; order is preserved.
    ///
    /// # Errors
    ///
    /// Returns a [`SnapshotError`] if the version or a secret name is empty, if two
    /// secrets share a name, or if a validation context pins a malformed fingerprint.
    pub fn assemble<I>(version: impl Into<String>, bundles: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = SecretBundle>,
    {
        let snapshot = Self {
            version: version.into(),
            secrets: bundles.into_iter().collect(),
        };
        snapshot.check_consistency()?;

        debug!(
            "assembled snapshot {:?} with {} secrets",
            snapshot.version,
            snapshot.secrets.len()
        );
        for pin in snapshot.unresolved_pins() {
            debug!(
                "snapshot {:?}: secret {:?} pins {} which no certificate secret in this snapshot matches",
                snapshot.version,
                pin.secret,
                pin.fingerprint
            );
        }

        Ok(snapshot)
    }

    /// Re-runs the assembly-time consistency check.
    ///
    /// # Errors
    ///
    /// See [`Snapshot::assemble`].
    pub fn check_consistency(&self) -> Result<(), SnapshotError> {
        if self.version.is_empty() {
            return Err(SnapshotError::EmptyVersion);
        }

        let mut names = HashSet::with_capacity(self.secrets.len());
        for (index, secret) in self.secrets.iter().enumerate() {
            if secret.name().is_empty() {
                return Err(SnapshotError::EmptyName {
                    version: self.version.clone(),
                    index,
                });
            }
            if !names.insert(secret.name()) {
                return Err(SnapshotError::DuplicateName {
                    version: self.version.clone(),
                    name: secret.name().to_owned(),
                });
            }

            let Some(ctx) = secret.as_validation_context() else {
                continue;
            };
            for pin in ctx.verify_certificate_hash() {
                if let Err(source) = Fingerprint::from_str(pin) {
                    return Err(SnapshotError::MalformedFingerprint {
                        version: self.version.clone(),
                        name: secret.name().to_owned(),
                        fingerprint: pin.clone(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    /// The snapshot version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Type URL of the resources in this snapshot.
    pub fn type_url(&self) -> &'static str {
        SECRET_TYPE_URL
    }

    /// The secrets, in assembly order.
    pub fn secrets(&self) -> &[SecretBundle] {
        &self.secrets
    }

    /// Looks a secret up by name.
    pub fn get(&self, name: &str) -> Option<&SecretBundle> {
        self.secrets.iter().find(|secret| secret.name() == name)
    }

    /// Secret names, in assembly order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.secrets.iter().map(SecretBundle::name)
    }

    /// Number of secrets.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    /// Returns `true` if the snapshot holds no secret.
    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    /// Pins that match no certificate secret of this snapshot. Advisory only.
    pub fn unresolved_pins(&self) -> Vec<UnresolvedPin<'_>> {
        let served: HashSet<Fingerprint> = self
            .secrets
            .iter()
            .filter_map(SecretBundle::as_tls_certificate)
            .filter_map(|tls| tls.leaf_fingerprint())
            .collect();

        let mut unresolved = Vec::new();
        for secret in self.secrets.iter() {
            let Some(ctx) = secret.as_validation_context() else {
                continue;
            };
            for pin in ctx.verify_certificate_hash() {
                let resolved = Fingerprint::from_str(pin)
                    .map(|fp| served.contains(&fp))
                    .unwrap_or(false);
                if !resolved {
                    unresolved.push(UnresolvedPin {
                        secret: secret.name(),
                        fingerprint: pin,
                    });
                }
            }
        }
        unresolved
    }
}
