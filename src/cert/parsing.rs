//! Internal parsing helpers.

use crate::cert::error::{CertificateError, PrivateKeyError};
use crate::cert::Certificate;
use pkcs8::der::asn1::AnyRef;
use pkcs8::der::Encode;
use pkcs8::{AlgorithmIdentifierRef, ObjectIdentifier, PrivateKeyInfo};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::PrivateKeyDer;
use x509_parser::certificate::X509Certificate;
use x509_parser::error::X509Error;
use x509_parser::nom::Err;
use x509_parser::pem::Pem;

/// Maximum number of certificates accepted in one PEM certificate chain.
///
/// A served chain is a leaf plus a handful of intermediates; anything longer
/// is treated as malformed input.
const MAX_CERT_CHAIN_LENGTH: usize = 16;

const CERTIFICATE_LABEL: &str = "CERTIFICATE";

// rsaEncryption (RFC 8017, A.1)
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// Parses the given DER-encoded bytes as exactly one X.509 certificate.
pub(crate) fn parse_der_encoded_bytes_as_x509_certificate(
    der_bytes: &[u8],
) -> Result<X509Certificate<'_>, CertificateError> {
    match x509_parser::parse_x509_certificate(der_bytes) {
        Ok((rest, _)) if !rest.is_empty() => Err(CertificateError::TrailingData(rest.len())),
        Ok((_, cert)) => Ok(cert),
        Err(Err::Incomplete(_)) => Err(CertificateError::ParseX509Certificate(
            X509Error::InvalidCertificate,
        )),
        Err(Err::Error(e) | Err::Failure(e)) => Err(CertificateError::ParseX509Certificate(e)),
    }
}

/// Decodes every `CERTIFICATE` block of a PEM document, in order.
///
/// Fails on non-certificate blocks, on chains longer than [`MAX_CERT_CHAIN_LENGTH`]
/// and on documents without any certificate.
pub(crate) fn pem_to_certificate_vec(pem: &[u8]) -> Result<Vec<Certificate>, CertificateError> {
    let mut certs = Vec::new();

    for block in Pem::iter_from_buffer(pem) {
        let block = block?;
        if block.label != CERTIFICATE_LABEL {
            return Err(CertificateError::UnexpectedPemLabel(block.label));
        }
        if certs.len() >= MAX_CERT_CHAIN_LENGTH {
            return Err(CertificateError::TooManyCertificates {
                max: MAX_CERT_CHAIN_LENGTH,
            });
        }
        certs.push(Certificate::try_from(block.contents)?);
    }

    if certs.is_empty() {
        return Err(CertificateError::Empty);
    }
    Ok(certs)
}

/// Decodes the first private key block of a PEM document into PKCS#8 DER.
///
/// `PRIVATE KEY` (PKCS#8) blocks are returned as they are and `RSA PRIVATE KEY`
/// (PKCS#1) blocks are wrapped into PKCS#8. `EC PRIVATE KEY` (SEC1) blocks are
/// rejected.
pub(crate) fn pem_to_pkcs8_der(pem: &[u8]) -> Result<Vec<u8>, PrivateKeyError> {
    match PrivateKeyDer::from_pem_slice(pem).map_err(PrivateKeyError::Pem)? {
        PrivateKeyDer::Pkcs8(key) => Ok(key.secret_pkcs8_der().to_vec()),
        PrivateKeyDer::Pkcs1(key) => pkcs1_to_pkcs8_der(key.secret_pkcs1_der()),
        PrivateKeyDer::Sec1(_) => Err(PrivateKeyError::UnsupportedEncoding("SEC1")),
        _ => Err(PrivateKeyError::UnsupportedEncoding("unknown")),
    }
}

/// Checks that a PEM document holds a private key block (PKCS#8, PKCS#1 or SEC1).
/// PKCS#8 keys are also decoded.
pub(crate) fn check_private_key_pem(pem: &[u8]) -> Result<(), PrivateKeyError> {
    match PrivateKeyDer::from_pem_slice(pem).map_err(PrivateKeyError::Pem)? {
        PrivateKeyDer::Pkcs8(key) => PrivateKeyInfo::try_from(key.secret_pkcs8_der())
            .map(|_| ())
            .map_err(PrivateKeyError::DecodePkcs8),
        _ => Ok(()),
    }
}

fn pkcs1_to_pkcs8_der(pkcs1_der: &[u8]) -> Result<Vec<u8>, PrivateKeyError> {
    let algorithm = AlgorithmIdentifierRef {
        oid: RSA_ENCRYPTION,
        parameters: Some(AnyRef::NULL),
    };
    PrivateKeyInfo::new(algorithm, pkcs1_der)
        .to_der()
        .map_err(PrivateKeyError::EncodePkcs8)
}
