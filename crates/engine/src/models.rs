//! Host-side models: what a node is configured with and what it is fed.
//!
//! `NodeDefinition` is plain serde JSON so it can be read from a file or an
//! API payload as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// InputItem
// ---------------------------------------------------------------------------

/// One record from the upstream data stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputItem {
    #[serde(default)]
    pub json: Value,
}

impl From<Value> for InputItem {
    fn from(json: Value) -> Self {
        Self { json }
    }
}

// ---------------------------------------------------------------------------
// NodeDefinition
// ---------------------------------------------------------------------------

/// A configured node instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Identifier used in logs and error messages.
    pub id: String,
    /// Maps to a registered `ExecutableNode` implementation.
    pub node_type: String,
    /// Parameter values; strings of the form `={{ $json.path }}` are
    /// evaluated against each input item.
    #[serde(default)]
    pub parameters: Map<String, Value>,
    /// Turn per-item failures into `{error}` records instead of aborting.
    #[serde(default)]
    pub continue_on_fail: bool,
}

impl NodeDefinition {
    /// `parameters` must be a JSON object; anything else yields no parameters.
    pub fn new(id: impl Into<String>, node_type: impl Into<String>, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id: id.into(),
            node_type: node_type.into(),
            parameters,
            continue_on_fail: false,
        }
    }

    pub fn continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn definition_defaults_when_fields_are_omitted() {
        let def: NodeDefinition =
            serde_json::from_value(json!({ "id": "kl", "node_type": "knowledgelib" })).unwrap();
        assert!(def.parameters.is_empty());
        assert!(!def.continue_on_fail);
    }

    #[test]
    fn non_object_parameters_are_dropped() {
        let def = NodeDefinition::new("kl", "knowledgelib", json!("nope"));
        assert!(def.parameters.is_empty());
    }
}
