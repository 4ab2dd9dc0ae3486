//! Named credential objects served to discovery consumers.
//!
//! A [`SecretBundle`] carries all of its material inline as raw PEM bytes: either
//! a certificate chain with its private key, or a trust anchor with optional
//! certificate pins. Building a bundle is pure and never fails; malformed input
//! is reported by the layers that produced it or by snapshot assembly.

use crate::authority::LeafCredential;
use crate::cert::{Certificate, Fingerprint};
use crate::constants::VALIDATION_SUFFIX;
use std::fmt;
use zeroize::Zeroize;

/// Inline private key bytes, zeroized on drop.
#[derive(Clone, Eq, PartialEq, Zeroize)]
#[zeroize(drop)]
pub struct KeyMaterial(Vec<u8>);

impl KeyMaterial {
    /// Returns the key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for KeyMaterial {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for KeyMaterial {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.0.len())
            .finish()
    }
}

/// A certificate chain and its private key.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TlsCertificateSecret {
    private_key: KeyMaterial,
    certificate_chain: Vec<u8>,
}

impl TlsCertificateSecret {
    /// PEM-encoded private key.
    pub fn private_key(&self) -> &KeyMaterial {
        &self.private_key
    }

    /// PEM-encoded certificate chain, leaf first.
    pub fn certificate_chain(&self) -> &[u8] {
        &self.certificate_chain
    }

    /// Fingerprint of the first certificate of the chain, if the chain parses.
    pub fn leaf_fingerprint(&self) -> Option<Fingerprint> {
        Certificate::chain_from_pem(&self.certificate_chain)
            .ok()?
            .first()
            .map(Certificate::fingerprint)
    }
}

/// A trust anchor plus the fingerprints of peer certificates it accepts.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ValidationContextSecret {
    trusted_ca: Vec<u8>,
    verify_certificate_hash: Vec<String>,
}

impl ValidationContextSecret {
    /// PEM-encoded trusted CA certificates.
    pub fn trusted_ca(&self) -> &[u8] {
        &self.trusted_ca
    }

    /// Pinned SHA-256 fingerprints, as given. Validated at snapshot assembly.
    pub fn verify_certificate_hash(&self) -> &[String] {
        &self.verify_certificate_hash
    }
}

/// The material carried by a [`SecretBundle`].
#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum SecretKind {
    /// A certificate secret.
    TlsCertificate(TlsCertificateSecret),
    /// A validation-context secret.
    ValidationContext(ValidationContextSecret),
}

/// A named credential object.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SecretBundle {
    name: String,
    kind: SecretKind,
}

impl SecretBundle {
    /// Wraps the PEM material of an issued leaf as a certificate secret.
    pub fn tls_certificate(name: impl Into<String>, leaf: &LeafCredential) -> Self {
        Self::tls_certificate_from_pem(name, leaf.private_key_pem(), leaf.certificate_pem())
    }

    /// Builds a certificate secret from static PEM material.
    pub fn tls_certificate_from_pem(
        name: impl Into<String>,
        private_key_pem: impl AsRef<[u8]>,
        certificate_chain_pem: impl AsRef<[u8]>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: SecretKind::TlsCertificate(TlsCertificateSecret {
                private_key: KeyMaterial(private_key_pem.as_ref().to_vec()),
                certificate_chain: certificate_chain_pem.as_ref().to_vec(),
            }),
        }
    }

    /// Builds a validation-context secret trusting `trusted_ca_pem` and, when
    /// `pinned_fingerprints` is not empty, only peers whose certificate matches one
    /// of the pins.
    ///
    /// Pins that parse as a [`Fingerprint`] are stored in canonical uppercase
    /// colon-hex form and deduplicated by digest, keeping first-seen order. Pins
    /// that do not parse are kept verbatim so snapshot assembly can reject them.
    pub fn validation_context<I, S>(
        name: impl Into<String>,
        trusted_ca_pem: impl AsRef<[u8]>,
        pinned_fingerprints: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut pins: Vec<String> = Vec::new();
        for pin in pinned_fingerprints {
            let pin = pin.into();
            let pin = match pin.parse::<Fingerprint>() {
                Ok(fingerprint) => fingerprint.to_string(),
                Err(_) => pin,
            };
            if !pins.contains(&pin) {
                pins.push(pin);
            }
        }

        Self {
            name: name.into(),
            kind: SecretKind::ValidationContext(ValidationContextSecret {
                trusted_ca: trusted_ca_pem.as_ref().to_vec(),
                verify_certificate_hash: pins,
            }),
        }
    }

    /// Builds the certificate secret for `leaf` named `name`, plus its companion
    /// validation context `<name>_validation` trusting `trusted_ca_pem` and pinning
    /// the leaf's own fingerprint.
    pub fn tls_certificate_with_validation(
        name: &str,
        leaf: &LeafCredential,
        trusted_ca_pem: impl AsRef<[u8]>,
    ) -> [Self; 2] {
        [
            Self::tls_certificate(name, leaf),
            Self::validation_context(
                format!("{name}{VALIDATION_SUFFIX}"),
                trusted_ca_pem,
                [leaf.fingerprint().to_string()],
            ),
        ]
    }

    /// The secret name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The secret material.
    pub fn kind(&self) -> &SecretKind {
        &self.kind
    }

    /// The certificate secret, if this is one.
    pub fn as_tls_certificate(&self) -> Option<&TlsCertificateSecret> {
        match &self.kind {
            SecretKind::TlsCertificate(secret) => Some(secret),
            _ => None,
        }
    }

    /// The validation-context secret, if this is one.
    pub fn as_validation_context(&self) -> Option<&ValidationContextSecret> {
        match &self.kind {
            SecretKind::ValidationContext(secret) => Some(secret),
            _ => None,
        }
    }

    /// Total inline bytes carried by the secret.
    pub fn material_len(&self) -> usize {
        match &self.kind {
            SecretKind::TlsCertificate(secret) => {
                secret.private_key.as_bytes().len() + secret.certificate_chain.len()
            }
            SecretKind::ValidationContext(secret) => {
                secret.trusted_ca.len()
                    + secret
                        .verify_certificate_hash
                        .iter()
                        .map(String::len)
                        .sum::<usize>()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CA_CERT: &str = include_str!("../../tests/testdata/ca-cert.pem");
    const APP1_CERT: &str = include_str!("../../tests/testdata/app1-cert.pem");
    const APP1_KEY: &str = include_str!("../../tests/testdata/app1-key.pem");

    #[test]
    fn test_static_certificate_secret_is_inline_pem() {
        let secret = SecretBundle::tls_certificate_from_pem("app1_cert", APP1_KEY, APP1_CERT);

        assert_eq!(secret.name(), "app1_cert");
        let tls = secret.as_tls_certificate().unwrap();
        assert_eq!(tls.private_key().as_bytes(), APP1_KEY.as_bytes());
        assert_eq!(tls.certificate_chain(), APP1_CERT.as_bytes());
        assert!(secret.as_validation_context().is_none());
        assert_eq!(secret.material_len(), APP1_KEY.len() + APP1_CERT.len());
    }

    #[test]
    fn test_leaf_fingerprint_of_static_chain() {
        let secret = SecretBundle::tls_certificate_from_pem("app1_cert", APP1_KEY, APP1_CERT);

        assert_eq!(
            secret.as_tls_certificate().unwrap().leaf_fingerprint().unwrap().to_string(),
            "C1:FB:2C:2A:A7:CB:A7:FB:01:16:18:04:73:0B:44:30:03:40:DD:6C:73:E6:43:0A:04:2F:EC:98:62:D8:E2:EE"
        );
    }

    #[test]
    fn test_validation_context_dedups_pins_in_order() {
        let secret = SecretBundle::validation_context("redis", CA_CERT, ["B", "A", "B"]);

        let ctx = secret.as_validation_context().unwrap();
        assert_eq!(ctx.trusted_ca(), CA_CERT.as_bytes());
        assert_eq!(ctx.verify_certificate_hash(), &["B".to_owned(), "A".to_owned()]);
    }

    #[test]
    fn test_validation_context_canonicalizes_pins() {
        let fingerprint = Certificate::chain_from_pem(APP1_CERT.as_bytes()).unwrap()[0].fingerprint();
        let canonical = fingerprint.to_string();
        let bare_lower = canonical.replace(':', "").to_lowercase();

        let secret = SecretBundle::validation_context("app1_validation", CA_CERT, [bare_lower]);

        let pins = secret.as_validation_context().unwrap().verify_certificate_hash();
        assert_eq!(pins, &[canonical.clone()]);
        assert!(pins[0].chars().all(|c| c == ':' || c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_validation_context_dedups_pins_by_digest() {
        let fingerprint = Certificate::chain_from_pem(APP1_CERT.as_bytes()).unwrap()[0].fingerprint();
        let canonical = fingerprint.to_string();
        let colon_lower = canonical.to_lowercase();
        let bare_upper = canonical.replace(':', "");

        let secret = SecretBundle::validation_context(
            "app1_validation",
            CA_CERT,
            [colon_lower, "B".to_owned(), bare_upper, canonical.clone()],
        );

        let ctx = secret.as_validation_context().unwrap();
        assert_eq!(ctx.verify_certificate_hash(), &[canonical, "B".to_owned()]);
    }

    #[test]
    fn test_validation_context_without_pins() {
        let secret = SecretBundle::validation_context("app_ca", CA_CERT, Vec::<String>::new());

        assert!(secret
            .as_validation_context()
            .unwrap()
            .verify_certificate_hash()
            .is_empty());
    }
}
