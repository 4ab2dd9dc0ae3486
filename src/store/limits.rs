use super::errors::{LimitKind, RejectReason};
use crate::snapshot::Snapshot;

/// Limits enforced on every snapshot before it is published.
///
/// Use `None` for unlimited, or `Some(usize)` for a specific limit.
///
/// # Examples
///
/// ```rust
/// use chute::store::SnapshotLimits;
///
/// let limits = SnapshotLimits {
///     max_secrets: Some(64),
///     max_secret_bytes: None,
/// };
/// assert_ne!(limits, SnapshotLimits::unlimited());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotLimits {
    /// Maximum number of secrets in one snapshot.
    pub max_secrets: Option<usize>,
    /// Maximum inline bytes (key + chain, or trust anchor + pins) of one secret.
    pub max_secret_bytes: Option<usize>,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            max_secrets: Some(1024),
            max_secret_bytes: Some(4 * 1024 * 1024), // 4MB
        }
    }
}

impl SnapshotLimits {
    /// Limits that never reject anything.
    pub const fn unlimited() -> Self {
        Self {
            max_secrets: None,
            max_secret_bytes: None,
        }
    }
}

pub(super) fn validate_limits(
    snapshot: &Snapshot,
    limits: SnapshotLimits,
) -> Result<(), RejectReason> {
    if let Some(max_secrets) = limits.max_secrets {
        let actual = snapshot.len();
        if actual > max_secrets {
            return Err(RejectReason::ResourceLimitExceeded {
                kind: LimitKind::MaxSecrets,
                limit: max_secrets,
                actual,
            });
        }
    }

    if let Some(max_secret_bytes) = limits.max_secret_bytes {
        for secret in snapshot.secrets() {
            let actual = secret.material_len();
            if actual > max_secret_bytes {
                return Err(RejectReason::ResourceLimitExceeded {
                    kind: LimitKind::MaxSecretBytes,
                    limit: max_secret_bytes,
                    actual,
                });
            }
        }
    }

    Ok(())
}
