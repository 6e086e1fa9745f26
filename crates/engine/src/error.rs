//! Engine-level error types.

use nodes::NodeError;
use thiserror::Error;

/// Errors produced by the host runtime while running a node.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No implementation is registered for the definition's `node_type`.
    #[error("no implementation registered for node_type '{0}'")]
    UnknownNodeType(String),

    /// The HTTP client could not be built from the executor config.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    /// The node aborted the batch.
    #[error("node '{node_id}' failed: {source}")]
    Node {
        node_id: String,
        #[source]
        source: NodeError,
    },
}

impl EngineError {
    /// Index of the input item that aborted the batch, if any.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::Node {
                source: NodeError::ItemFailed { item_index, .. },
                ..
            } => Some(*item_index),
            _ => None,
        }
    }
}
