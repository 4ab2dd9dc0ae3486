//! Error types for certificate, private key and fingerprint parsing.

use x509_parser::error::{PEMError, X509Error};

/// An error that may arise parsing X.509 certificates.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CertificateError {
    /// Error returned by the X.509 parsing library.
    #[error("failed parsing X.509 certificate")]
    ParseX509Certificate(#[from] X509Error),

    /// The DER input carries bytes after the certificate.
    #[error("unexpected {0} trailing bytes after X.509 certificate")]
    TrailingData(usize),

    /// The PEM input is not well formed.
    #[error("failed decoding PEM block")]
    Pem(#[from] PEMError),

    /// A PEM block other than `CERTIFICATE` was found.
    #[error("unexpected PEM block label {0:?}, expected \"CERTIFICATE\"")]
    UnexpectedPemLabel(String),

    /// The PEM input contains no certificate at all.
    #[error("no certificate found in PEM input")]
    Empty,

    /// The chain exceeds the number of certificates that will be parsed.
    #[error("certificate chain is too long (max {max})")]
    TooManyCertificates {
        /// Maximum number of certificates accepted in one chain.
        max: usize,
    },
}

/// An error that may arise decoding private keys.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PrivateKeyError {
    /// Error returned by the pkcs#8 private key decoding library.
    #[error("failed decoding PKCS#8 private key")]
    DecodePkcs8(pkcs8::Error),

    /// The input holds no private key PEM block, or the block does not decode.
    #[error("failed decoding private key PEM")]
    Pem(#[source] rustls_pki_types::pem::Error),

    /// The key is in an encoding that cannot be converted to PKCS#8.
    #[error("unsupported private key encoding: {0}")]
    UnsupportedEncoding(&'static str),

    /// A PKCS#1 key could not be re-encoded as PKCS#8.
    #[error("failed encoding private key as PKCS#8")]
    EncodePkcs8(pkcs8::der::Error),
}

/// An error that may arise parsing a SHA-256 certificate fingerprint.
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
#[non_exhaustive]
pub enum FingerprintError {
    /// The fingerprint has neither 64 hex characters nor 32 colon-separated pairs.
    #[error("fingerprint must be 64 hex characters or 32 colon-separated hex pairs (got {len} characters)")]
    InvalidLength {
        /// Length of the rejected input.
        len: usize,
    },

    /// A colon-separated fingerprint has a group that is not exactly two characters.
    #[error("fingerprint group {index} is not a hex pair")]
    InvalidGroup {
        /// Zero-based index of the offending group.
        index: usize,
    },

    /// The fingerprint contains a non-hex character.
    #[error("fingerprint is not valid hex")]
    InvalidHex(#[from] hex::FromHexError),
}
