//! In-memory credential store keyed by credential type name.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use nodes::{CredentialData, CredentialSource, NodeError};

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: HashMap<String, CredentialData>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` (a JSON object) under `credential_type`, replacing any
    /// previous entry.
    pub fn insert(&mut self, credential_type: impl Into<String>, data: Value) {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.entries.insert(credential_type.into(), data);
    }

    pub fn with(mut self, credential_type: impl Into<String>, data: Value) -> Self {
        self.insert(credential_type, data);
        self
    }

    pub fn contains(&self, credential_type: &str) -> bool {
        self.entries.contains_key(credential_type)
    }
}

#[async_trait]
impl CredentialSource for CredentialStore {
    async fn credentials(&self, credential_type: &str) -> Result<CredentialData, NodeError> {
        self.entries
            .get(credential_type)
            .cloned()
            .ok_or_else(|| NodeError::CredentialsNotFound(credential_type.to_owned()))
    }
}
