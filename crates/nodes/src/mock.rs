//! Test doubles for the host capabilities and for `ExecutableNode`.
//!
//! Useful in unit and integration tests where a real host, credential store
//! or remote service is either unavailable or irrelevant.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::http::url_with_query;
use crate::traits::{
    CredentialData, CredentialSource, ExecutionContext, HttpClient, HttpRequest, HttpResponse,
    OutputItem, ParameterSource,
};
use crate::{ExecutableNode, HttpError, NodeError};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters shared by every item, with optional per-item overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticParameters {
    shared: Map<String, Value>,
    per_item: HashMap<usize, Map<String, Value>>,
}

impl StaticParameters {
    /// `params` must be a JSON object; anything else yields no parameters.
    pub fn new(params: Value) -> Self {
        Self {
            shared: into_object(params),
            per_item: HashMap::new(),
        }
    }

    /// Override parameters for a single item.
    pub fn with_item(mut self, item_index: usize, params: Value) -> Self {
        self.per_item.insert(item_index, into_object(params));
        self
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

impl ParameterSource for StaticParameters {
    fn parameter(&self, name: &str, item_index: usize) -> Option<Value> {
        self.per_item
            .get(&item_index)
            .and_then(|m| m.get(name))
            .or_else(|| self.shared.get(name))
            .cloned()
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// What the mock store answers for every lookup.
#[derive(Debug, Clone)]
pub enum CredentialBehaviour {
    Return(CredentialData),
    NotConfigured,
    StoreFailure(String),
}

/// A credential store double that records every type it is asked for.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    pub behaviour: CredentialBehaviour,
    pub lookups: Arc<Mutex<Vec<String>>>,
}

impl StaticCredentials {
    pub fn returning(data: Value) -> Self {
        Self::with_behaviour(CredentialBehaviour::Return(into_object(data)))
    }

    pub fn not_configured() -> Self {
        Self::with_behaviour(CredentialBehaviour::NotConfigured)
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self::with_behaviour(CredentialBehaviour::StoreFailure(msg.into()))
    }

    fn with_behaviour(behaviour: CredentialBehaviour) -> Self {
        Self {
            behaviour,
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn credentials(&self, credential_type: &str) -> Result<CredentialData, NodeError> {
        self.lookups.lock().unwrap().push(credential_type.to_owned());
        match &self.behaviour {
            CredentialBehaviour::Return(data) => Ok(data.clone()),
            CredentialBehaviour::NotConfigured => {
                Err(NodeError::CredentialsNotFound(credential_type.to_owned()))
            }
            CredentialBehaviour::StoreFailure(msg) => Err(NodeError::CredentialStore(msg.clone())),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Programmed answer for one URL.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Json(Value),
    Text(String),
    Fail(HttpError),
}

/// An HTTP client double keyed by full URL (query string included, encoded
/// the same way the real client encodes it). Unknown URLs answer 404.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    routes: HashMap<String, MockResponse>,
    /// All requests seen by this client (in call order).
    pub calls: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, url: impl Into<String>, body: Value) -> Self {
        self.routes.insert(url.into(), MockResponse::Json(body));
        self
    }

    pub fn text(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), MockResponse::Text(body.into()));
        self
    }

    pub fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        let err = HttpError::Status {
            url: url.clone(),
            status,
        };
        self.routes.insert(url, MockResponse::Fail(err));
        self
    }

    /// Number of requests sent through this client.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Full URLs of every request, in call order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|r| url_with_query(&r.url, &r.query))
            .collect()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = url_with_query(&request.url, &request.query);
        self.calls.lock().unwrap().push(request);

        match self.routes.get(&url) {
            Some(MockResponse::Json(v)) => Ok(HttpResponse::Json(v.clone())),
            Some(MockResponse::Text(s)) => Ok(HttpResponse::Text(s.clone())),
            Some(MockResponse::Fail(e)) => Err(e.clone()),
            None => Err(HttpError::Status { url, status: 404 }),
        }
    }
}

/// Build a context over the given doubles.
pub fn context(
    item_count: usize,
    continue_on_fail: bool,
    parameters: StaticParameters,
    credentials: StaticCredentials,
    http: MockHttpClient,
) -> ExecutionContext {
    ExecutionContext {
        execution_id: uuid::Uuid::new_v4(),
        item_count,
        continue_on_fail,
        parameters: Arc::new(parameters),
        credentials: Arc::new(credentials),
        http: Arc::new(http),
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Emit this value once per input item.
    ReturnValue(Value),
    /// Fail on the given item index.
    FailAt(usize, NodeError),
}

/// A mock node that counts its executions and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    pub behaviour: MockBehaviour,
    /// Item counts of every batch seen by this node (in call order).
    pub calls: Arc<Mutex<Vec<usize>>>,
}

impl MockNode {
    /// Create a mock that succeeds with `value` for every item.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::ReturnValue(value),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that fails once it reaches `item_index`.
    pub fn failing_at(name: impl Into<String>, item_index: usize, err: NodeError) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::FailAt(item_index, err),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, ctx: &ExecutionContext) -> Result<Vec<OutputItem>, NodeError> {
        self.calls.lock().unwrap().push(ctx.item_count);

        let mut out = Vec::with_capacity(ctx.item_count);
        for i in 0..ctx.item_count {
            match &self.behaviour {
                MockBehaviour::ReturnValue(v) => out.push(OutputItem::new(v.clone(), i)),
                MockBehaviour::FailAt(at, err) if *at == i => {
                    return Err(err.clone().at_item(i));
                }
                MockBehaviour::FailAt(..) => {
                    out.push(OutputItem::new(serde_json::json!({ "node": self.name }), i));
                }
            }
        }
        Ok(out)
    }
}
