//! Resolution of the optional `knowledgelibApi` credential.

use serde_json::Value;
use tracing::{debug, warn};

use super::description::{CREDENTIAL_TYPE, DEFAULT_API_URL};
use crate::traits::{CredentialData, CredentialSource};
use crate::NodeError;

/// Base URL and optional bearer token for the catalog service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgelibCredentials {
    pub api_url: String,
    pub api_key: Option<String>,
}

impl Default for KnowledgelibCredentials {
    /// The free public API: default root, no key.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            api_key: None,
        }
    }
}

fn non_empty_str(data: &CredentialData, key: &str) -> Option<String> {
    match data.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

impl KnowledgelibCredentials {
    /// Read stored fields; empty or missing fields fall back to the defaults.
    pub fn from_data(data: &CredentialData) -> Self {
        Self {
            api_url: non_empty_str(data, "apiUrl").unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
            api_key: non_empty_str(data, "apiKey"),
        }
    }

    /// Look up the credential in the host store.
    ///
    /// Never fails: the node is usable without any stored credential.
    pub async fn resolve(source: &dyn CredentialSource) -> Self {
        match source.credentials(CREDENTIAL_TYPE).await {
            Ok(data) => Self::from_data(&data),
            Err(NodeError::CredentialsNotFound(_)) => {
                debug!("no {CREDENTIAL_TYPE} credential configured, using public API");
                Self::default()
            }
            Err(err) => {
                warn!(error = %err, "could not read {CREDENTIAL_TYPE} credential, using public API");
                Self::default()
            }
        }
    }

    /// Headers to put on every outgoing request.
    pub fn auth_headers(&self) -> Vec<(String, String)> {
        match &self.api_key {
            Some(key) => vec![("Authorization".to_owned(), format!("Bearer {key}"))],
            None => Vec::new(),
        }
    }
}
