//! Leaf issuance: fresh key pairs signed by the [`RootAuthority`].

use super::error::IssuanceError;
use super::RootAuthority;
use crate::cert::{Certificate, Fingerprint, PrivateKey};
use crate::prelude::debug;
use rcgen::{
    CertificateParams, DistinguishedName, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose, SerialNumber, PKCS_ECDSA_P256_SHA256,
};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use zeroize::Zeroizing;

/// Subject attributes of an issued leaf. Absent attributes are left out of the
/// distinguished name.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Subject {
    /// Organization (`O`).
    #[serde(default)]
    pub organization: Option<String>,
    /// Country (`C`).
    #[serde(default)]
    pub country: Option<String>,
    /// State or province (`ST`).
    #[serde(default)]
    pub province: Option<String>,
    /// Locality (`L`).
    #[serde(default)]
    pub locality: Option<String>,
    /// Common name (`CN`).
    #[serde(default)]
    pub common_name: Option<String>,
}

impl Subject {
    /// Creates an empty subject.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the organization.
    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Sets the country.
    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    /// Sets the state or province.
    pub fn with_province(mut self, province: impl Into<String>) -> Self {
        self.province = Some(province.into());
        self
    }

    /// Sets the locality.
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Sets the common name.
    pub fn with_common_name(mut self, common_name: impl Into<String>) -> Self {
        self.common_name = Some(common_name.into());
        self
    }

    fn distinguished_name(&self) -> DistinguishedName {
        let mut name = DistinguishedName::new();
        let attributes = [
            (DnType::CountryName, &self.country),
            (DnType::StateOrProvinceName, &self.province),
            (DnType::LocalityName, &self.locality),
            (DnType::OrganizationName, &self.organization),
            (DnType::CommonName, &self.common_name),
        ];
        for (ty, value) in attributes {
            if let Some(value) = value {
                name.push(ty, value.as_str());
            }
        }
        name
    }
}

/// Extended key usages a leaf can be issued for.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedKeyUsage {
    /// TLS client authentication.
    ClientAuth,
    /// TLS server authentication.
    ServerAuth,
}

impl From<ExtendedKeyUsage> for ExtendedKeyUsagePurpose {
    fn from(usage: ExtendedKeyUsage) -> Self {
        match usage {
            ExtendedKeyUsage::ClientAuth => ExtendedKeyUsagePurpose::ClientAuth,
            ExtendedKeyUsage::ServerAuth => ExtendedKeyUsagePurpose::ServerAuth,
        }
    }
}

/// The `[not_before, not_after]` window of an issued certificate, at second precision.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ValidityWindow {
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
}

impl ValidityWindow {
    /// Builds the window starting at `start` (truncated to whole seconds) and lasting
    /// `years` calendar years. A start on February 29 ends on March 1 when the end
    /// year is not a leap year.
    ///
    /// # Errors
    ///
    /// Returns [`IssuanceError::InvalidValidity`] for zero years or an end date out of range.
    pub fn years_from(start: OffsetDateTime, years: u32) -> Result<Self, IssuanceError> {
        let invalid = || IssuanceError::InvalidValidity { years };
        if years == 0 {
            return Err(invalid());
        }

        let not_before = start.replace_nanosecond(0).map_err(|_| invalid())?;
        let end_year = i32::try_from(years)
            .ok()
            .and_then(|years| not_before.year().checked_add(years))
            .ok_or_else(invalid)?;
        let not_after = match not_before.replace_year(end_year) {
            Ok(not_after) => not_after,
            Err(_) => not_before
                .replace_day(28)
                .and_then(|t| t.replace_year(end_year))
                .map(|t| t + Duration::days(1))
                .map_err(|_| invalid())?,
        };

        Ok(Self {
            not_before,
            not_after,
        })
    }

    /// Start of the window.
    pub fn not_before(&self) -> OffsetDateTime {
        self.not_before
    }

    /// End of the window.
    pub fn not_after(&self) -> OffsetDateTime {
        self.not_after
    }

    /// Length of the window.
    pub fn duration(&self) -> Duration {
        self.not_after - self.not_before
    }
}

/// A freshly issued leaf: CA-signed certificate plus its private key, in DER and PEM.
///
/// Never mutated after creation.
#[derive(Clone)]
pub struct LeafCredential {
    subject: Subject,
    validity: ValidityWindow,
    usages: Vec<ExtendedKeyUsage>,
    certificate: Certificate,
    private_key: PrivateKey,
    certificate_pem: String,
    private_key_pem: Zeroizing<String>,
}

impl LeafCredential {
    /// Subject the leaf was issued for.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Validity window of the certificate.
    pub fn validity(&self) -> ValidityWindow {
        self.validity
    }

    /// Extended key usages, sorted and deduplicated.
    pub fn usages(&self) -> &[ExtendedKeyUsage] {
        &self.usages
    }

    /// DER-encoded certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// PKCS#8 DER-encoded private key.
    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    /// PEM-encoded certificate.
    pub fn certificate_pem(&self) -> &str {
        &self.certificate_pem
    }

    /// PEM-encoded (PKCS#8) private key.
    pub fn private_key_pem(&self) -> &str {
        &self.private_key_pem
    }

    /// SHA-256 fingerprint of the certificate.
    pub fn fingerprint(&self) -> Fingerprint {
        self.certificate.fingerprint()
    }
}

impl fmt::Debug for LeafCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafCredential")
            .field("subject", &self.subject)
            .field("validity", &self.validity)
            .field("usages", &self.usages)
            .field("fingerprint", &self.fingerprint())
            .field("private_key", &self.private_key)
            .finish()
    }
}

/// Issues leaf credentials signed by a shared [`RootAuthority`].
///
/// Issuance touches no shared mutable state, so one issuer may be used from any
/// number of threads at once.
#[derive(Clone, Debug)]
pub struct LeafIssuer {
    root: Arc<RootAuthority>,
}

impl LeafIssuer {
    /// Creates an issuer backed by `root`.
    pub fn new(root: Arc<RootAuthority>) -> Self {
        Self { root }
    }

    /// Returns the root this issuer signs with.
    pub fn root(&self) -> &Arc<RootAuthority> {
        &self.root
    }

    /// Issues a leaf valid from now for `validity_years` years.
    ///
    /// Each call generates a fresh ECDSA P-256 key pair. The certificate carries the
    /// `digitalSignature` key usage and exactly the requested extended key usages.
    ///
    /// # Errors
    ///
    /// Returns an [`IssuanceError`] if key generation or signing fails, or if the
    /// validity cannot be represented.
    pub fn issue(
        &self,
        subject: &Subject,
        validity_years: u32,
        usages: &[ExtendedKeyUsage],
    ) -> Result<LeafCredential, IssuanceError> {
        let validity = ValidityWindow::years_from(OffsetDateTime::now_utc(), validity_years)?;
        self.issue_with_validity(subject, validity, usages)
    }

    /// Issues a leaf for an explicit validity window.
    ///
    /// # Errors
    ///
    /// See [`LeafIssuer::issue`].
    pub fn issue_with_validity(
        &self,
        subject: &Subject,
        validity: ValidityWindow,
        usages: &[ExtendedKeyUsage],
    ) -> Result<LeafCredential, IssuanceError> {
        let key = KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)
            .map_err(IssuanceError::KeyGeneration)?;

        let mut usages = usages.to_vec();
        usages.sort_unstable();
        usages.dedup();

        let mut params = CertificateParams::default();
        params.distinguished_name = subject.distinguished_name();
        params.not_before = validity.not_before();
        params.not_after = validity.not_after();
        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        params.extended_key_usages = usages.iter().copied().map(Into::into).collect();
        params.use_authority_key_identifier_extension = true;
        params.serial_number = Some(serial_for(&key));

        let signed = params
            .signed_by(&key, self.root.issuer())
            .map_err(IssuanceError::Signing)?;

        let credential = LeafCredential {
            subject: subject.clone(),
            validity,
            usages,
            certificate: Certificate::try_from(signed.der().to_vec())?,
            private_key: PrivateKey::try_from(key.serialize_der())?,
            certificate_pem: signed.pem(),
            private_key_pem: Zeroizing::new(key.serialize_pem()),
        };

        debug!(
            "issued leaf {:?} (sha256 {}) valid until {}",
            credential.subject,
            credential.fingerprint(),
            credential.validity.not_after()
        );
        Ok(credential)
    }
}

// Positive 128-bit serial derived from the fresh public key.
fn serial_for(key: &KeyPair) -> SerialNumber {
    let digest = Sha256::digest(key.public_key_raw());
    let mut serial = digest[..16].to_vec();
    serial[0] &= 0x7f;
    SerialNumber::from_slice(&serial)
}
