//! Navigation error types.

use sitenav_source::{NodeId, SourceError};

/// Error returned by tree construction and navigation.
///
/// Missing nodes are not errors: lookups return `None` for them.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// Fetching records from the node source failed.
    #[error("Node source failed: {0}")]
    Source(#[from] SourceError),
    /// A parent walk revisited a node.
    #[error("Cycle detected above node {id}: walk exceeded {limit} steps")]
    Cycle {
        /// Node the walk started from.
        id: NodeId,
        /// Step bound that was exceeded (number of cached nodes).
        limit: usize,
    },
    /// The tree build failed earlier in this request.
    #[error("Navigation tree unavailable: build failed for this request")]
    Unavailable,
}
