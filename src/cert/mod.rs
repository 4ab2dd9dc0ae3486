//! `Certificate`, `PrivateKey` and `Fingerprint` types and helpers.
//!
//! `Certificate` and `PrivateKey` wrap DER-encoded bytes and validate them at
//! construction time.

use crate::cert::error::{CertificateError, PrivateKeyError};
use crate::cert::parsing::{
    check_private_key_pem, parse_der_encoded_bytes_as_x509_certificate, pem_to_certificate_vec,
    pem_to_pkcs8_der,
};
use pkcs8::PrivateKeyInfo;
use zeroize::Zeroize;

pub mod error;
pub mod fingerprint;
pub(crate) mod parsing;

pub use fingerprint::Fingerprint;

/// A single DER-encoded X.509 certificate.
///
/// Invariant: instances are always validated as parseable DER-encoded X.509.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Certificate(Vec<u8>);

impl Certificate {
    /// Returns the certificate bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the SHA-256 fingerprint of the certificate.
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_der(&self.0)
    }

    /// Parses every `CERTIFICATE` block of a PEM document, preserving order.
    ///
    /// # Errors
    ///
    /// Returns a [`CertificateError`] if a block is not a certificate, does not
    /// parse, or if the document holds no certificate.
    pub fn chain_from_pem(pem: &[u8]) -> Result<Vec<Certificate>, CertificateError> {
        pem_to_certificate_vec(pem)
    }
}

impl AsRef<[u8]> for Certificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: &[u8]) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(der_bytes)?;
        Ok(Self(Vec::from(der_bytes)))
    }
}

impl TryFrom<Vec<u8>> for Certificate {
    type Error = CertificateError;

    fn try_from(der_bytes: Vec<u8>) -> Result<Self, Self::Error> {
        parse_der_encoded_bytes_as_x509_certificate(&der_bytes)?;
        Ok(Self(der_bytes))
    }
}

/// A DER-encoded private key in PKCS#8 format.
///
/// Invariant: instances are always validated as parseable PKCS#8.
///
/// This type is zeroized on drop.
#[derive(Clone, Eq, PartialEq, Zeroize)]
#[zeroize(drop)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    /// Returns the private key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decodes a PEM private key. PKCS#8 (`PRIVATE KEY`) and PKCS#1
    /// (`RSA PRIVATE KEY`) blocks are accepted; PKCS#1 keys are re-encoded as PKCS#8.
    ///
    /// # Errors
    ///
    /// Returns a [`PrivateKeyError`] if no private key block is found, if the block
    /// is SEC1 (`EC PRIVATE KEY`), or if the decoded key is not valid PKCS#8.
    pub fn from_pem(pem: &[u8]) -> Result<Self, PrivateKeyError> {
        let der = pem_to_pkcs8_der(pem)?;
        Self::try_from(der)
    }

    /// Checks that `pem` holds a PKCS#8, PKCS#1 or SEC1 private key block without
    /// converting it.
    ///
    /// # Errors
    ///
    /// Returns a [`PrivateKeyError`] if no private key block is found or if a PKCS#8
    /// block does not decode.
    pub fn check_pem(pem: &[u8]) -> Result<(), PrivateKeyError> {
        check_private_key_pem(pem)
    }
}

impl AsRef<[u8]> for PrivateKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<Vec<u8>> for PrivateKey {
    type Error = PrivateKeyError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        PrivateKeyInfo::try_from(bytes.as_slice()).map_err(PrivateKeyError::DecodePkcs8)?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("len", &self.0.len())
            .finish()
    }
}
