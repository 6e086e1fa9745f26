//! Node execution runtime.
//!
//! `NodeExecutor` plays the host's part for a single node run:
//! 1. Looks up the node implementation by `node_type`.
//! 2. Binds the definition's parameters to the batch's input items.
//! 3. Hands the node an `ExecutionContext` with the credential store and
//!    HTTP client.
//! 4. Returns the node's records, or the error that aborted the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument};

use nodes::knowledgelib::{KnowledgelibNode, NODE_NAME};
use nodes::{CredentialSource, ExecutableNode, ExecutionContext, HttpClient, OutputItem, ReqwestClient};

use crate::models::{InputItem, NodeDefinition};
use crate::parameters::JsonParameters;
use crate::EngineError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Tuning knobs for the HTTP client handed to nodes.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Total timeout for a single HTTP request.
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: format!("knowledgelib-node/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ---------------------------------------------------------------------------
// Node registry
// ---------------------------------------------------------------------------

/// Maps `node_type` strings to shared `ExecutableNode` implementations.
pub type NodeRegistry = HashMap<String, Arc<dyn ExecutableNode>>;

/// Registry with every built-in node.
pub fn default_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.insert(NODE_NAME.to_owned(), Arc::new(KnowledgelibNode::new()));
    registry
}

// ---------------------------------------------------------------------------
// Output of a completed execution
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ExecutionResult {
    pub execution_id: uuid::Uuid,
    /// Records in input order.
    pub items: Vec<OutputItem>,
}

// ---------------------------------------------------------------------------
// NodeExecutor
// ---------------------------------------------------------------------------

/// Stateless runner; construct once and call [`NodeExecutor::run`] per batch.
pub struct NodeExecutor {
    registry: NodeRegistry,
    credentials: Arc<dyn CredentialSource>,
    http: Arc<dyn HttpClient>,
}

impl NodeExecutor {
    pub fn new(
        registry: NodeRegistry,
        credentials: Arc<dyn CredentialSource>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            registry,
            credentials,
            http,
        }
    }

    /// Build an executor backed by a real HTTP client.
    ///
    /// # Errors
    /// [`EngineError::HttpClient`] if the client cannot be built.
    pub fn with_config(
        registry: NodeRegistry,
        credentials: Arc<dyn CredentialSource>,
        config: &ExecutorConfig,
    ) -> Result<Self, EngineError> {
        let http = ReqwestClient::with_settings(config.request_timeout, &config.user_agent)
            .map_err(|e| EngineError::HttpClient(e.to_string()))?;
        Ok(Self::new(registry, credentials, Arc::new(http)))
    }

    /// Run `definition` over `items` and return its records.
    ///
    /// # Errors
    /// [`EngineError::UnknownNodeType`] for unregistered nodes,
    /// [`EngineError::Node`] when the node aborts the batch.
    #[instrument(skip_all, fields(node_id = %definition.id, node_type = %definition.node_type))]
    pub async fn run(
        &self,
        definition: &NodeDefinition,
        items: &[InputItem],
    ) -> Result<ExecutionResult, EngineError> {
        let node = self
            .registry
            .get(&definition.node_type)
            .ok_or_else(|| EngineError::UnknownNodeType(definition.node_type.clone()))?;

        let execution_id = uuid::Uuid::new_v4();
        let ctx = ExecutionContext {
            execution_id,
            item_count: items.len(),
            continue_on_fail: definition.continue_on_fail,
            parameters: Arc::new(JsonParameters::new(definition.parameters.clone(), items)),
            credentials: Arc::clone(&self.credentials),
            http: Arc::clone(&self.http),
        };

        info!(%execution_id, items = items.len(), "running node");

        match node.execute(&ctx).await {
            Ok(records) => {
                info!(%execution_id, records = records.len(), "node '{}' succeeded", definition.id);
                Ok(ExecutionResult {
                    execution_id,
                    items: records,
                })
            }
            Err(source) => {
                error!(%execution_id, "node '{}' failed: {}", definition.id, source);
                Err(EngineError::Node {
                    node_id: definition.id.clone(),
                    source,
                })
            }
        }
    }
}
