//! Error types for root loading and leaf issuance.

use crate::cert::error::{CertificateError, PrivateKeyError};
use x509_parser::error::X509Error;

/// An error that may arise loading a [`RootAuthority`](super::RootAuthority) or
/// verifying material against it.
///
/// Every variant returned by [`RootAuthority::load`](super::RootAuthority::load)
/// means the root key material is malformed.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AuthorityError {
    /// The root certificate PEM does not decode to exactly one certificate.
    #[error("malformed key material: root certificate")]
    Certificate(#[from] CertificateError),

    /// The root private key PEM does not hold a PKCS#8 or PKCS#1 private key.
    #[error("malformed key material: root private key encoding")]
    PrivateKeyEncoding(#[from] PrivateKeyError),

    /// The root private key cannot be loaded as a signing key.
    #[error("malformed key material: root private key")]
    PrivateKey(#[source] rcgen::Error),

    /// The root certificate cannot be used as an issuer.
    #[error("malformed key material: root certificate is not usable as issuer")]
    Issuer(#[source] rcgen::Error),

    /// The root private key does not match the root certificate's public key.
    #[error("malformed key material: root private key does not match the root certificate")]
    KeyMismatch,

    /// A certificate was not issued by this root.
    #[error("certificate was not issued by root {root_subject:?}")]
    NotIssued {
        /// Subject of the root the certificate was checked against.
        root_subject: String,
        /// Underlying verification failure.
        #[source]
        source: X509Error,
    },

    /// A certificate names another issuer than this root.
    #[error("certificate issuer {issuer:?} is not root {root_subject:?}")]
    IssuerMismatch {
        /// Issuer named by the certificate.
        issuer: String,
        /// Subject of the root the certificate was checked against.
        root_subject: String,
    },
}

impl AuthorityError {
    /// Returns `true` if the error describes unusable root key material.
    pub fn is_malformed_key_material(&self) -> bool {
        matches!(
            self,
            Self::Certificate(_)
                | Self::PrivateKeyEncoding(_)
                | Self::PrivateKey(_)
                | Self::Issuer(_)
                | Self::KeyMismatch
        )
    }
}

/// An error that may arise issuing a leaf credential.
///
/// Issuance errors are terminal for the request that produced them only.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IssuanceError {
    /// The key pair for the leaf could not be generated.
    #[error("failed generating leaf key pair")]
    KeyGeneration(#[source] rcgen::Error),

    /// The leaf certificate could not be signed by the root.
    #[error("failed signing leaf certificate")]
    Signing(#[source] rcgen::Error),

    /// The validity window cannot be represented.
    #[error("invalid validity of {years} years")]
    InvalidValidity {
        /// The requested number of years.
        years: u32,
    },

    /// The signed certificate failed re-validation.
    #[error("issued certificate does not parse")]
    Certificate(#[from] CertificateError),

    /// The generated private key failed re-validation.
    #[error("issued private key does not decode")]
    PrivateKey(#[from] PrivateKeyError),
}
