//! Constants shared by the issuance, snapshot and distribution layers.

/// Type URL of the secret resources served to discovery consumers.
pub const SECRET_TYPE_URL: &str = "type.googleapis.com/envoy.api.v2.auth.Secret";

/// Consumer identity assigned to requests that carry no node.
pub const UNKNOWN_NODE_ID: &str = "unknown";

/// Suffix of the validation-context secret paired with an issued certificate secret.
pub const VALIDATION_SUFFIX: &str = "_validation";

/// Default validity, in years, of an issued leaf certificate.
pub const DEFAULT_VALIDITY_YEARS: u32 = 1;

/// Number of bytes in a SHA-256 certificate fingerprint.
pub const FINGERPRINT_LEN: usize = 32;
