use crate::constants::UNKNOWN_NODE_ID;
use crate::discovery::Node;

/// Maps the node attached to a request to the consumer identity snapshots are
/// published under.
///
/// # Example
///
/// ```
/// use chute::discovery::Node;
/// use chute::store::NodeHash;
///
/// #[derive(Debug)]
/// struct ClusterHash;
///
/// impl NodeHash for ClusterHash {
///     fn id(&self, node: Option<&Node>) -> String {
///         node.map_or_else(|| "unknown".to_owned(), |n| n.cluster.clone())
///     }
/// }
/// ```
pub trait NodeHash: Send + Sync + 'static {
    /// Returns the consumer identity for `node`.
    fn id(&self, node: Option<&Node>) -> String;
}

/// Uses the node identity as consumer identity; requests without a node map to
/// `"unknown"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeIdHash;

impl NodeHash for NodeIdHash {
    fn id(&self, node: Option<&Node>) -> String {
        node.map_or_else(|| UNKNOWN_NODE_ID.to_owned(), |node| node.id.clone())
    }
}
