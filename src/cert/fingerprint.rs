//! SHA-256 certificate fingerprints, as used for certificate pinning.

use crate::cert::error::FingerprintError;
use crate::constants::FINGERPRINT_LEN;
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest of a DER-encoded certificate.
///
/// Renders as uppercase colon-separated hex (`AB:CD:...`), the form carried by
/// validation-context secrets. Parsing accepts that form as well as 64 bare hex
/// characters, in either case.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Computes the fingerprint of a DER-encoded certificate.
    pub fn of_der(der: &[u8]) -> Self {
        Self(Sha256::digest(der).into())
    }

    /// Returns the raw digest.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Returns the uppercase colon-separated hex rendering.
    pub fn to_colon_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Fingerprint").field(&self.to_string()).finish()
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact = if s.contains(':') {
            let mut compact = String::with_capacity(FINGERPRINT_LEN * 2);
            let mut groups = 0usize;
            for (index, group) in s.split(':').enumerate() {
                if group.len() != 2 {
                    return Err(FingerprintError::InvalidGroup { index });
                }
                compact.push_str(group);
                groups += 1;
            }
            if groups != FINGERPRINT_LEN {
                return Err(FingerprintError::InvalidLength { len: s.len() });
            }
            compact
        } else {
            if s.len() != FINGERPRINT_LEN * 2 {
                return Err(FingerprintError::InvalidLength { len: s.len() });
            }
            s.to_owned()
        };

        let mut digest = [0u8; FINGERPRINT_LEN];
        hex::decode_to_slice(compact, &mut digest)?;
        Ok(Self(digest))
    }
}

impl TryFrom<&str> for Fingerprint {
    type Error = FingerprintError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `openssl x509 -noout -fingerprint -sha256 -in tests/testdata/app1-cert.pem`
    const APP1_FINGERPRINT: &str = "C1:FB:2C:2A:A7:CB:A7:FB:01:16:18:04:73:0B:44:30:03:40:DD:6C:73:E6:43:0A:04:2F:EC:98:62:D8:E2:EE";

    #[test]
    fn test_fingerprint_matches_openssl() {
        let pem = include_bytes!("../../tests/testdata/app1-cert.pem");
        let certs = crate::cert::parsing::pem_to_certificate_vec(pem).unwrap();

        let fingerprint = Fingerprint::of_der(certs[0].as_bytes());

        assert_eq!(fingerprint.to_string(), APP1_FINGERPRINT);
    }

    #[test]
    fn test_parse_colon_hex_and_bare_hex() {
        let colon: Fingerprint = APP1_FINGERPRINT.parse().unwrap();
        let bare: Fingerprint = APP1_FINGERPRINT.replace(':', "").to_lowercase().parse().unwrap();

        assert_eq!(colon, bare);
        assert_eq!(bare.to_colon_hex(), APP1_FINGERPRINT);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Fingerprint::from_str("abc"),
            Err(FingerprintError::InvalidLength { len: 3 })
        ));
        assert!(matches!(
            Fingerprint::from_str("AB:CD:E"),
            Err(FingerprintError::InvalidGroup { index: 2 })
        ));
        assert!(matches!(
            Fingerprint::from_str("AB:CD"),
            Err(FingerprintError::InvalidLength { .. })
        ));
        assert!(matches!(
            Fingerprint::from_str(&"ZZ".repeat(32)),
            Err(FingerprintError::InvalidHex(_))
        ));
    }
}
