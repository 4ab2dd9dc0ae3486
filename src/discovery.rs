//! Value types exchanged with the discovery-protocol frontend.
//!
//! The frontend owns the wire protocol; these types carry only the fields the
//! store and the callback hooks act on.

use crate::secret::SecretBundle;

/// Identifier the frontend assigns to an open stream.
pub type StreamId = i64;

/// The consumer node attached to a discovery request.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Node {
    /// Node identity, used as consumer identity by [`NodeIdHash`](crate::store::NodeIdHash).
    pub id: String,
    /// Cluster the node belongs to.
    pub cluster: String,
}

impl Node {
    /// Creates a node with the given identity and no cluster.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cluster: String::new(),
        }
    }
}

/// A discovery request, as received on a stream or a one-shot fetch.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DiscoveryRequest {
    /// Version last accepted by the consumer, empty on first request.
    pub version_info: String,
    /// The requesting node.
    pub node: Option<Node>,
    /// Requested resource names; empty means all.
    pub resource_names: Vec<String>,
    /// Requested resource type.
    pub type_url: String,
    /// Nonce of the response being acknowledged.
    pub response_nonce: String,
}

/// A discovery response built from a published snapshot.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DiscoveryResponse {
    /// Version of the snapshot the resources come from.
    pub version_info: String,
    /// Type of the resources.
    pub type_url: String,
    /// The resources served.
    pub resources: Vec<SecretBundle>,
}
