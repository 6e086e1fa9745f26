//! The `ExecutableNode` trait and the host capabilities a node is handed.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{HttpError, NodeError};

/// Raw credential fields as stored by the host, keyed by field name.
pub type CredentialData = Map<String, Value>;

/// Per-item parameter lookup.
///
/// Values are resolved per item; the host may evaluate expressions against
/// the item's payload.
pub trait ParameterSource: Send + Sync {
    /// Value of parameter `name` for the item at `item_index`, if set.
    fn parameter(&self, name: &str, item_index: usize) -> Option<Value>;
}

/// Host credential store.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch the credential fields stored under `credential_type`.
    ///
    /// # Errors
    /// [`NodeError::CredentialsNotFound`] when nothing is configured for the
    /// type, [`NodeError::CredentialStore`] when the store itself fails.
    async fn credentials(&self, credential_type: &str) -> Result<CredentialData, NodeError>;
}

/// How the body of an HTTP response should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Text,
}

/// A GET request as issued by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Query pairs in the order they should appear on the wire.
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub response_format: ResponseFormat,
}

impl HttpRequest {
    /// A GET for `url` that expects a JSON body.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            response_format: ResponseFormat::Json,
        }
    }

    pub fn query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Expect a raw text body instead of JSON.
    pub fn text(mut self) -> Self {
        self.response_format = ResponseFormat::Text;
        self
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpResponse {
    Json(Value),
    Text(String),
}

impl HttpResponse {
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(v) => v,
            Self::Text(s) => Value::String(s),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Json(Value::String(s)) => s,
            Self::Json(v) => v.to_string(),
        }
    }
}

/// Outgoing HTTP capability provided by the host.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Issue the request, failing on transport errors, non-2xx statuses and
    /// bodies that do not decode as `request.response_format`.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}

/// Context passed to a node for one batch execution.
///
/// Holds the host capabilities for the batch; tests swap in the doubles from
/// [`crate::mock`].
#[derive(Clone)]
pub struct ExecutionContext {
    /// ID of the current execution run.
    pub execution_id: uuid::Uuid,
    /// Number of input items in the batch.
    pub item_count: usize,
    /// Turn per-item failures into error records instead of aborting.
    pub continue_on_fail: bool,
    pub parameters: Arc<dyn ParameterSource>,
    pub credentials: Arc<dyn CredentialSource>,
    pub http: Arc<dyn HttpClient>,
}

/// One record emitted by a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputItem {
    pub json: Value,
    /// Index of the input item this record was produced from.
    pub paired_item: usize,
}

impl OutputItem {
    pub fn new(json: Value, paired_item: usize) -> Self {
        Self { json, paired_item }
    }
}

/// The core node trait.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Process every input item of the batch described by `ctx` and return
    /// the node's output records.
    async fn execute(&self, ctx: &ExecutionContext) -> Result<Vec<OutputItem>, NodeError>;
}
