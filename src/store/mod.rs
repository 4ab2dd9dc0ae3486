//! Per-consumer store of active snapshots.
//!
//! [`SnapshotStore`] maps consumer identities to the snapshot currently served to
//! them. Publishing swaps a consumer's snapshot in one step; readers never observe
//! a partially installed set of secrets.
//!
//! Every publish re-checks snapshot consistency and enforces [`SnapshotLimits`]
//! before anything is installed.

mod cache;
mod errors;
mod hash;
mod limits;

pub use cache::{SnapshotStore, SnapshotStoreBuilder, StoreUpdates};
pub use errors::{LimitKind, RejectReason, StoreError};
pub use hash::{NodeHash, NodeIdHash};
pub use limits::SnapshotLimits;
