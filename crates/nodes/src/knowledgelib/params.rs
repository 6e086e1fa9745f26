//! Operation selection and per-operation parameters.
//!
//! Raw parameter values come from the host as loosely-typed JSON; they are
//! checked here once so the dispatcher only ever sees a valid
//! [`OperationParameters`].

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::description::{node_description, NodeDescription, MAX_LIMIT, MIN_LIMIT};
use crate::traits::ParameterSource;
use crate::NodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Query,
    GetUnit,
    ListDomains,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::GetUnit => "getUnit",
            Self::ListDomains => "listDomains",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = NodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "getUnit" => Ok(Self::GetUnit),
            "listDomains" => Ok(Self::ListDomains),
            other => Err(NodeError::UnknownOperation(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFormat {
    Markdown,
    Json,
}

impl FromStr for UnitFormat {
    type Err = NodeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md" | "markdown" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(NodeError::InvalidParameter {
                name: "format".into(),
                message: format!("expected 'md' or 'json', got '{other}'"),
            }),
        }
    }
}

/// Validated parameters for one item, keyed by operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationParameters {
    Query {
        query: String,
        /// Always within `[MIN_LIMIT, MAX_LIMIT]`.
        limit: u64,
        /// `None` when the filter is empty.
        domain: Option<String>,
        fetch_full_content: bool,
    },
    GetUnit {
        unit_id: String,
        format: UnitFormat,
    },
    ListDomains,
}

/// Reads raw parameters, substituting declared defaults for unset ones.
pub struct ParameterReader<'a> {
    source: &'a dyn ParameterSource,
    description: NodeDescription,
}

impl<'a> ParameterReader<'a> {
    pub fn new(source: &'a dyn ParameterSource) -> Self {
        Self {
            source,
            description: node_description(),
        }
    }

    fn raw(&self, name: &str, item_index: usize) -> Option<Value> {
        self.source
            .parameter(name, item_index)
            .filter(|v| !v.is_null())
            .or_else(|| self.description.default_for(name))
    }

    fn string(&self, name: &str, item_index: usize) -> Result<String, NodeError> {
        match self.raw(name, item_index) {
            Some(Value::String(s)) => Ok(s),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(Value::Null) | None => Err(NodeError::MissingParameter(name.to_owned())),
            Some(other) => Err(invalid(name, format!("expected a string, got {other}"))),
        }
    }

    fn required_string(&self, name: &str, item_index: usize) -> Result<String, NodeError> {
        let s = self.string(name, item_index)?;
        if s.trim().is_empty() {
            return Err(NodeError::MissingParameter(name.to_owned()));
        }
        Ok(s)
    }

    fn boolean(&self, name: &str, item_index: usize) -> Result<bool, NodeError> {
        match self.raw(name, item_index) {
            Some(Value::Bool(b)) => Ok(b),
            Some(Value::String(s)) => match s.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(invalid(name, format!("expected a boolean, got '{s}'"))),
            },
            Some(Value::Null) | None => Ok(false),
            Some(other) => Err(invalid(name, format!("expected a boolean, got {other}"))),
        }
    }

    /// Out-of-range limits are clamped rather than rejected.
    fn limit(&self, item_index: usize) -> Result<u64, NodeError> {
        let n = match self.raw("limit", item_index) {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
        .ok_or_else(|| invalid("limit", "expected a number"))?;

        Ok(n.round().clamp(MIN_LIMIT as f64, MAX_LIMIT as f64) as u64)
    }

    /// The batch-wide operation, read at item 0.
    pub fn operation(&self) -> Result<Operation, NodeError> {
        self.string("operation", 0)?.parse()
    }

    /// Validate the parameters `operation` needs for the item at `item_index`.
    pub fn parameters(
        &self,
        operation: Operation,
        item_index: usize,
    ) -> Result<OperationParameters, NodeError> {
        match operation {
            Operation::Query => {
                let domain = match self.string("domain", item_index) {
                    Ok(d) => Some(d).filter(|d| !d.is_empty()),
                    Err(NodeError::MissingParameter(_)) => None,
                    Err(err) => return Err(err),
                };
                Ok(OperationParameters::Query {
                    query: self.required_string("query", item_index)?,
                    limit: self.limit(item_index)?,
                    domain,
                    fetch_full_content: self.boolean("fetchFullContent", item_index)?,
                })
            }
            Operation::GetUnit => Ok(OperationParameters::GetUnit {
                unit_id: self.required_string("unitId", item_index)?,
                format: self.string("format", item_index)?.parse()?,
            }),
            Operation::ListDomains => Ok(OperationParameters::ListDomains),
        }
    }
}

fn invalid(name: &str, message: impl Into<String>) -> NodeError {
    NodeError::InvalidParameter {
        name: name.to_owned(),
        message: message.into(),
    }
}
