//! Static node and credential descriptions consumed by the host's form
//! renderer. Parameter defaults are read from here as well.

use serde::Serialize;
use serde_json::{json, Value};

pub const NODE_NAME: &str = "knowledgelib";
pub const CREDENTIAL_TYPE: &str = "knowledgelibApi";
pub const DEFAULT_API_URL: &str = "https://knowledgelib.io";

pub const MIN_LIMIT: u64 = 1;
pub const MAX_LIMIT: u64 = 20;
/// Clamped to the declared maximum.
pub const DEFAULT_LIMIT: u64 = MAX_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    Options,
    String,
    Number,
    Boolean,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOption {
    pub name: &'static str,
    pub value: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberRange {
    pub min_value: u64,
    pub max_value: u64,
}

/// One UI-declared parameter.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub display_name: &'static str,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub default: Value,
    pub required: bool,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PropertyOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<NumberRange>,
    /// Operations this field is shown for; empty means always visible.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub show_for_operations: Vec<&'static str>,
    /// Rendered as a password field.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub password: bool,
}

impl Property {
    fn new(
        display_name: &'static str,
        name: &'static str,
        kind: PropertyType,
        default: Value,
        description: &'static str,
    ) -> Self {
        Self {
            display_name,
            name,
            kind,
            default,
            required: false,
            description,
            options: Vec::new(),
            range: None,
            show_for_operations: Vec::new(),
            password: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn show_for(mut self, operation: &'static str) -> Self {
        self.show_for_operations.push(operation);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRef {
    pub name: &'static str,
    pub required: bool,
}

/// Everything the host needs to render and register the node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDescription {
    pub display_name: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub version: u32,
    pub credentials: Vec<CredentialRef>,
    pub properties: Vec<Property>,
    pub usable_as_tool: bool,
}

impl NodeDescription {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Declared default for parameter `name`.
    pub fn default_for(&self, name: &str) -> Option<Value> {
        self.property(name).map(|p| p.default.clone())
    }
}

pub fn node_description() -> NodeDescription {
    let operation = Property {
        options: vec![
            PropertyOption {
                name: "Query Knowledge",
                value: "query",
                description: Some("Search across all knowledge units by relevance"),
            },
            PropertyOption {
                name: "Get Unit",
                value: "getUnit",
                description: Some("Retrieve a specific knowledge unit by ID"),
            },
            PropertyOption {
                name: "List Domains",
                value: "listDomains",
                description: Some("List all available knowledge domains and unit counts"),
            },
        ],
        ..Property::new(
            "Operation",
            "operation",
            PropertyType::Options,
            json!("query"),
            "Operation to perform",
        )
    };

    let limit = Property {
        range: Some(NumberRange {
            min_value: MIN_LIMIT,
            max_value: MAX_LIMIT,
        }),
        ..Property::new(
            "Limit",
            "limit",
            PropertyType::Number,
            json!(DEFAULT_LIMIT),
            "Max number of results to return",
        )
        .show_for("query")
    };

    let format = Property {
        options: vec![
            PropertyOption {
                name: "Markdown",
                value: "md",
                description: None,
            },
            PropertyOption {
                name: "JSON",
                value: "json",
                description: None,
            },
        ],
        ..Property::new(
            "Format",
            "format",
            PropertyType::Options,
            json!("md"),
            "Response format: raw markdown or structured JSON with parsed frontmatter",
        )
        .show_for("getUnit")
    };

    NodeDescription {
        display_name: "Knowledgelib",
        name: NODE_NAME,
        description: "Query pre-verified, cited knowledge units from knowledgelib.io",
        version: 1,
        credentials: vec![CredentialRef {
            name: CREDENTIAL_TYPE,
            required: false,
        }],
        properties: vec![
            operation,
            Property::new(
                "Query",
                "query",
                PropertyType::String,
                json!(""),
                "Search query (e.g., \"best wireless earbuds under 150\")",
            )
            .required()
            .show_for("query"),
            limit,
            Property::new(
                "Domain Filter",
                "domain",
                PropertyType::String,
                json!(""),
                "Filter by domain (e.g., \"consumer_electronics\", \"computing\", \"home\", \"fitness\")",
            )
            .show_for("query"),
            Property::new(
                "Fetch Full Content",
                "fetchFullContent",
                PropertyType::Boolean,
                json!(false),
                "Whether to fetch the full markdown content of each matching unit (increases response size)",
            )
            .show_for("query"),
            Property::new(
                "Unit ID",
                "unitId",
                PropertyType::String,
                json!(""),
                "Unit ID path (e.g., \"consumer-electronics/audio/wireless-earbuds-under-150/2026\")",
            )
            .required()
            .show_for("getUnit"),
            format,
        ],
        usable_as_tool: true,
    }
}

/// Request issued to check that stored credentials work.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialTestRequest {
    pub method: &'static str,
    pub url: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescription {
    pub name: &'static str,
    pub display_name: &'static str,
    pub documentation_url: &'static str,
    pub properties: Vec<Property>,
    pub test: CredentialTestRequest,
}

pub fn credential_description() -> CredentialDescription {
    CredentialDescription {
        name: CREDENTIAL_TYPE,
        display_name: "Knowledgelib API",
        documentation_url: "https://knowledgelib.io/api",
        properties: vec![
            Property::new(
                "API URL",
                "apiUrl",
                PropertyType::String,
                json!(DEFAULT_API_URL),
                "Base URL for the knowledgelib.io API. Change only for self-hosted instances.",
            ),
            Property {
                password: true,
                ..Property::new(
                    "API Key",
                    "apiKey",
                    PropertyType::String,
                    json!(""),
                    "Optional API key. Not required for the free public API.",
                )
            },
        ],
        test: CredentialTestRequest {
            method: "GET",
            url: "/catalog.json",
        },
    }
}
