//! Node-level error types.

use thiserror::Error;

/// Failures of a single outgoing HTTP call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// The request never produced a response (DNS, connect, timeout, …).
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read or decoded.
    #[error("invalid response body from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Errors returned by a node's `execute` method.
///
/// Per-item failures are wrapped in [`NodeError::ItemFailed`] so the caller
/// always knows which input item triggered the abort.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// A required parameter was not supplied for the item.
    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    /// A parameter was supplied but has the wrong type or value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The `operation` parameter names an operation this node does not know.
    #[error("unknown operation '{0}'")]
    UnknownOperation(String),

    /// The credential store has no entry for the requested credential type.
    #[error("credentials of type '{0}' are not configured")]
    CredentialsNotFound(String),

    /// The credential store exists but could not be read.
    #[error("credential store failure: {0}")]
    CredentialStore(String),

    #[error(transparent)]
    Http(#[from] HttpError),

    /// A failure while processing one input item; aborts the batch.
    #[error("item {item_index} failed: {source}")]
    ItemFailed {
        item_index: usize,
        #[source]
        source: Box<NodeError>,
    },
}

impl NodeError {
    /// Attach the index of the input item that produced this error.
    pub fn at_item(self, item_index: usize) -> Self {
        Self::ItemFailed {
            item_index,
            source: Box::new(self),
        }
    }
}
