use super::errors::{RejectReason, StoreError};
use super::hash::{NodeHash, NodeIdHash};
use super::limits::{validate_limits, SnapshotLimits};
use crate::constants::SECRET_TYPE_URL;
use crate::discovery::{DiscoveryRequest, DiscoveryResponse, Node};
use crate::prelude::{info, warn};
use crate::snapshot::Snapshot;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::watch;

/// Handle for receiving publish notifications from a [`SnapshotStore`].
///
/// Every successful publish bumps a store-wide sequence number. Receivers observe
/// the latest value; a slow receiver may skip intermediate numbers.
#[derive(Clone, Debug)]
pub struct StoreUpdates {
    rx: watch::Receiver<u64>,
}

impl StoreUpdates {
    /// Waits for the next publish and returns the new sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] once the store has been dropped.
    pub async fn changed(&mut self) -> Result<u64, StoreError> {
        self.rx.changed().await.map_err(|_| StoreError::Closed)?;
        Ok(*self.rx.borrow())
    }

    /// Returns the last sequence number without waiting.
    pub fn last(&self) -> u64 {
        *self.rx.borrow()
    }
}

/// Per-consumer map of active snapshots.
///
/// Each consumer has at most one active snapshot. [`SnapshotStore::publish`]
/// replaces it in one step under the store lock, so [`SnapshotStore::get`] always
/// returns either the previous or the new snapshot, never a mix. Snapshots are
/// handed out as `Arc`s; the lock is held only for the map update itself.
pub struct SnapshotStore {
    // Active snapshot per consumer identity.
    snapshots: RwLock<HashMap<String, Arc<Snapshot>>>,

    limits: SnapshotLimits,
    node_hash: Box<dyn NodeHash>,

    // Publish notifications (monotonic sequence).
    update_tx: watch::Sender<u64>,
}

impl SnapshotStore {
    /// Creates a store with default limits and [`NodeIdHash`].
    pub fn new() -> Self {
        SnapshotStoreBuilder::new().build()
    }

    /// Returns a builder for a customized store.
    pub fn builder() -> SnapshotStoreBuilder {
        SnapshotStoreBuilder::new()
    }

    /// Installs `snapshot` as the only active snapshot for `consumer`.
    ///
    /// The same snapshot may be published to any number of consumers; each publish is
    /// atomic for its own consumer only.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::PublishRejected`] if the consumer identity is empty, if the
    /// snapshot fails the consistency check, or if it exceeds the configured limits.
    /// The consumer's previous snapshot is left untouched.
    pub fn publish(&self, consumer: &str, snapshot: &Snapshot) -> Result<(), StoreError> {
        if let Err(reason) = self.admit(consumer, snapshot) {
            warn!(
                "rejected snapshot {:?} for consumer {:?}: {}",
                snapshot.version(),
                consumer,
                reason
            );
            return Err(StoreError::PublishRejected {
                consumer: consumer.to_owned(),
                version: snapshot.version().to_owned(),
                reason,
            });
        }

        let entry = Arc::new(snapshot.clone());
        let previous = {
            let mut snapshots = self.write();
            let previous = snapshots.insert(consumer.to_owned(), entry);
            self.update_tx.send_modify(|seq| *seq += 1);
            previous
        };

        match previous {
            Some(previous) => info!(
                "consumer {:?}: snapshot {:?} replaced {:?}",
                consumer,
                snapshot.version(),
                previous.version()
            ),
            None => info!(
                "consumer {:?}: snapshot {:?} published",
                consumer,
                snapshot.version()
            ),
        }
        Ok(())
    }

    /// Returns the active snapshot for `consumer`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownConsumer`] if nothing was published for `consumer`.
    pub fn get(&self, consumer: &str) -> Result<Arc<Snapshot>, StoreError> {
        self.read()
            .get(consumer)
            .cloned()
            .ok_or_else(|| StoreError::UnknownConsumer {
                consumer: consumer.to_owned(),
            })
    }

    /// Returns the identities that have an active snapshot, sorted.
    pub fn consumers(&self) -> Vec<String> {
        let mut consumers: Vec<String> = self.read().keys().cloned().collect();
        consumers.sort_unstable();
        consumers
    }

    /// Maps a request node to its consumer identity.
    pub fn consumer_id(&self, node: Option<&Node>) -> String {
        self.node_hash.id(node)
    }

    /// Returns the active snapshot for the consumer `node` maps to.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownConsumer`] if nothing was published for it.
    pub fn snapshot_for_node(&self, node: Option<&Node>) -> Result<Arc<Snapshot>, StoreError> {
        self.get(&self.consumer_id(node))
    }

    /// Answers a one-shot discovery request.
    ///
    /// Returns `Ok(None)` when the consumer already holds the active version.
    /// Otherwise the response carries the requested secrets, or all of them when the
    /// request names none. Unknown names are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedResourceType`] for a non-secret type URL and
    /// [`StoreError::UnknownConsumer`] if nothing was published for the requester.
    pub fn fetch(
        &self,
        request: &DiscoveryRequest,
    ) -> Result<Option<DiscoveryResponse>, StoreError> {
        let consumer = self.consumer_id(request.node.as_ref());
        if !request.type_url.is_empty() && request.type_url != SECRET_TYPE_URL {
            return Err(StoreError::UnsupportedResourceType {
                consumer,
                type_url: request.type_url.clone(),
            });
        }

        let snapshot = self.get(&consumer)?;
        if request.version_info == snapshot.version() {
            return Ok(None);
        }

        let resources = if request.resource_names.is_empty() {
            snapshot.secrets().to_vec()
        } else {
            snapshot
                .secrets()
                .iter()
                .filter(|secret| request.resource_names.iter().any(|n| n == secret.name()))
                .cloned()
                .collect()
        };

        Ok(Some(DiscoveryResponse {
            version_info: snapshot.version().to_owned(),
            type_url: SECRET_TYPE_URL.to_owned(),
            resources,
        }))
    }

    /// Returns a handle that is notified after every successful publish.
    pub fn updated(&self) -> StoreUpdates {
        StoreUpdates {
            rx: self.update_tx.subscribe(),
        }
    }

    /// Returns the limits enforced on publish.
    pub fn limits(&self) -> SnapshotLimits {
        self.limits
    }

    fn admit(&self, consumer: &str, snapshot: &Snapshot) -> Result<(), RejectReason> {
        if consumer.is_empty() {
            return Err(RejectReason::EmptyConsumer);
        }
        snapshot.check_consistency()?;
        validate_limits(snapshot, self.limits)
    }

    // The map is only ever modified by whole-entry inserts, so a poisoned lock
    // still guards a coherent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<Snapshot>>> {
        self.snapshots.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<Snapshot>>> {
        self.snapshots.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("consumers", &self.consumers())
            .field("limits", &self.limits)
            .field("node_hash", &"<NodeHash>")
            .field("update_seq", &*self.update_tx.borrow())
            .finish()
    }
}

/// Builder for [`SnapshotStore`].
///
/// # Example
///
/// ```
/// use chute::store::{SnapshotLimits, SnapshotStore};
///
/// let store = SnapshotStore::builder()
///     .with_limits(SnapshotLimits::unlimited())
///     .build();
/// assert!(store.consumers().is_empty());
/// ```
pub struct SnapshotStoreBuilder {
    limits: SnapshotLimits,
    node_hash: Option<Box<dyn NodeHash>>,
}

impl SnapshotStoreBuilder {
    /// Creates a builder with default limits and [`NodeIdHash`].
    pub fn new() -> Self {
        Self {
            limits: SnapshotLimits::default(),
            node_hash: None,
        }
    }

    /// Sets the limits enforced on publish.
    #[must_use]
    pub fn with_limits(mut self, limits: SnapshotLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets how request nodes map to consumer identities.
    #[must_use]
    pub fn with_node_hash<H: NodeHash>(mut self, node_hash: H) -> Self {
        self.node_hash = Some(Box::new(node_hash));
        self
    }

    /// Builds the store.
    pub fn build(self) -> SnapshotStore {
        let (update_tx, _) = watch::channel(0);
        SnapshotStore {
            snapshots: RwLock::new(HashMap::new()),
            limits: self.limits,
            node_hash: self.node_hash.unwrap_or_else(|| Box::new(NodeIdHash)),
            update_tx,
        }
    }
}

impl Default for SnapshotStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SnapshotStoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStoreBuilder")
            .field("limits", &self.limits)
            .field("node_hash", &self.node_hash.as_ref().map(|_| "<NodeHash>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secret::SecretBundle;
    use crate::store::LimitKind;

    const APP1_CERT: &str = include_str!("../../tests/testdata/app1-cert.pem");
    const APP1_KEY: &str = include_str!("../../tests/testdata/app1-key.pem");

    fn snapshot(version: &str, names: &[&str]) -> Snapshot {
        Snapshot::assemble(
            version,
            names
                .iter()
                .map(|name| SecretBundle::tls_certificate_from_pem(*name, APP1_KEY, APP1_CERT)),
        )
        .unwrap()
    }

    #[test]
    fn test_get_before_publish_is_unknown_consumer() {
        let store = SnapshotStore::new();

        assert_eq!(
            store.get("ingress").unwrap_err(),
            StoreError::UnknownConsumer {
                consumer: "ingress".to_owned()
            }
        );
    }

    #[test]
    fn test_publish_replaces_previous_snapshot() {
        let store = SnapshotStore::new();
        store.publish("ingress", &snapshot("v1", &["a"])).unwrap();
        store.publish("ingress", &snapshot("v2", &["b", "c"])).unwrap();

        let active = store.get("ingress").unwrap();
        assert_eq!(active.version(), "v2");
        assert_eq!(active.names().collect::<Vec<_>>(), ["b", "c"]);
        assert_eq!(store.consumers(), ["ingress"]);
    }

    #[test]
    fn test_rejected_publish_leaves_prior_state() {
        let store = SnapshotStore::builder()
            .with_limits(SnapshotLimits {
                max_secrets: Some(1),
                max_secret_bytes: None,
            })
            .build();
        store.publish("app1", &snapshot("v1", &["a"])).unwrap();

        let err = store.publish("app1", &snapshot("v2", &["a", "b"])).unwrap_err();

        assert_eq!(
            err,
            StoreError::PublishRejected {
                consumer: "app1".to_owned(),
                version: "v2".to_owned(),
                reason: RejectReason::ResourceLimitExceeded {
                    kind: LimitKind::MaxSecrets,
                    limit: 1,
                    actual: 2,
                },
            }
        );
        assert_eq!(store.get("app1").unwrap().version(), "v1");
    }

    #[test]
    fn test_publish_rejects_oversized_secret() {
        let store = SnapshotStore::builder()
            .with_limits(SnapshotLimits {
                max_secrets: None,
                max_secret_bytes: Some(16),
            })
            .build();

        let err = store.publish("app1", &snapshot("v1", &["a"])).unwrap_err();

        assert!(matches!(
            err,
            StoreError::PublishRejected {
                reason: RejectReason::ResourceLimitExceeded {
                    kind: LimitKind::MaxSecretBytes,
                    ..
                },
                ..
            }
        ));
        assert!(store.get("app1").is_err());
    }

    #[test]
    fn test_publish_rejects_empty_consumer() {
        let store = SnapshotStore::new();

        let err = store.publish("", &snapshot("v1", &["a"])).unwrap_err();

        assert!(matches!(
            err,
            StoreError::PublishRejected {
                reason: RejectReason::EmptyConsumer,
                ..
            }
        ));
        assert!(store.consumers().is_empty());
    }

    #[test]
    fn test_snapshot_for_node_uses_node_hash() {
        let store = SnapshotStore::new();
        store.publish("unknown", &snapshot("v0", &["a"])).unwrap();
        store.publish("app1-envoy", &snapshot("v1", &["a"])).unwrap();

        let node = Node::new("app1-envoy");
        assert_eq!(store.snapshot_for_node(Some(&node)).unwrap().version(), "v1");
        assert_eq!(store.snapshot_for_node(None).unwrap().version(), "v0");
    }

    #[test]
    fn test_custom_node_hash() {
        #[derive(Debug)]
        struct ClusterHash;

        impl NodeHash for ClusterHash {
            fn id(&self, node: Option<&Node>) -> String {
                node.map(|n| n.cluster.clone()).unwrap_or_default()
            }
        }

        let store = SnapshotStore::builder().with_node_hash(ClusterHash).build();
        let node = Node {
            id: "pod-1".to_owned(),
            cluster: "edge".to_owned(),
        };

        assert_eq!(store.consumer_id(Some(&node)), "edge");
    }

    #[test]
    fn test_fetch() {
        let store = SnapshotStore::new();
        store.publish("app1", &snapshot("v1", &["a", "b"])).unwrap();

        let mut request = DiscoveryRequest {
            node: Some(Node::new("app1")),
            type_url: SECRET_TYPE_URL.to_owned(),
            resource_names: vec!["b".to_owned(), "missing".to_owned()],
            ..DiscoveryRequest::default()
        };

        let response = store.fetch(&request).unwrap().unwrap();
        assert_eq!(response.version_info, "v1");
        assert_eq!(response.type_url, SECRET_TYPE_URL);
        assert_eq!(response.resources.len(), 1);
        assert_eq!(response.resources[0].name(), "b");

        request.resource_names.clear();
        request.version_info = String::new();
        assert_eq!(store.fetch(&request).unwrap().unwrap().resources.len(), 2);

        request.version_info = "v1".to_owned();
        assert_eq!(store.fetch(&request).unwrap(), None);
    }

    #[test]
    fn test_fetch_rejects_other_resource_types() {
        let store = SnapshotStore::new();
        store.publish("app1", &snapshot("v1", &["a"])).unwrap();

        let request = DiscoveryRequest {
            node: Some(Node::new("app1")),
            type_url: "type.googleapis.com/envoy.api.v2.Cluster".to_owned(),
            ..DiscoveryRequest::default()
        };

        assert!(matches!(
            store.fetch(&request),
            Err(StoreError::UnsupportedResourceType { .. })
        ));
    }

    #[tokio::test]
    async fn test_updates_follow_publishes() {
        let store = SnapshotStore::new();
        let mut updates = store.updated();
        assert_eq!(updates.last(), 0);

        store.publish("ingress", &snapshot("v1", &["a"])).unwrap();
        assert_eq!(updates.changed().await.unwrap(), 1);

        let _ = store.publish("", &snapshot("v2", &["a"]));
        store.publish("app1", &snapshot("v1", &["a"])).unwrap();
        assert_eq!(updates.changed().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_updates_close_with_store() {
        let store = SnapshotStore::new();
        let mut updates = store.updated();
        drop(store);

        assert_eq!(updates.changed().await.unwrap_err(), StoreError::Closed);
    }
}
