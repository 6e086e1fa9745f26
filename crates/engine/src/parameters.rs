//! Per-item parameter resolution.
//!
//! A parameter is either a literal JSON value, returned for every item, or an
//! expression string `={{ $json.some.path }}` evaluated against the item's
//! payload. Only field access is supported.

use serde_json::{Map, Value};

use nodes::ParameterSource;

use crate::models::InputItem;

/// Parameters of one node definition bound to the batch's input items.
#[derive(Debug, Clone)]
pub struct JsonParameters {
    parameters: Map<String, Value>,
    items: Vec<Value>,
}

impl JsonParameters {
    pub fn new(parameters: Map<String, Value>, items: &[InputItem]) -> Self {
        Self {
            parameters,
            items: items.iter().map(|i| i.json.clone()).collect(),
        }
    }
}

/// Dotted path inside `={{ $json... }}`, or `None` for literals.
fn expression_path(raw: &str) -> Option<&str> {
    let inner = raw
        .trim()
        .strip_prefix("={{")?
        .strip_suffix("}}")?
        .trim()
        .strip_prefix("$json")?;
    if inner.is_empty() {
        return Some("");
    }
    inner.strip_prefix('.')
}

fn lookup<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(root);
    }
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(arr) => segment.parse::<usize>().ok().and_then(|i| arr.get(i)),
        _ => None,
    })
}

impl ParameterSource for JsonParameters {
    fn parameter(&self, name: &str, item_index: usize) -> Option<Value> {
        let raw = self.parameters.get(name)?;
        let Value::String(s) = raw else {
            return Some(raw.clone());
        };
        match expression_path(s) {
            Some(path) => {
                let item = self.items.get(item_index)?;
                lookup(item, path).filter(|v| !v.is_null()).cloned()
            }
            None => Some(raw.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(parameters: Value, items: Vec<Value>) -> JsonParameters {
        let items: Vec<InputItem> = items.into_iter().map(InputItem::from).collect();
        JsonParameters::new(parameters.as_object().unwrap().clone(), &items)
    }

    #[test]
    fn literals_are_shared_by_every_item() {
        let p = params(json!({ "limit": 5, "query": "tents" }), vec![json!({}), json!({})]);
        assert_eq!(p.parameter("limit", 1), Some(json!(5)));
        assert_eq!(p.parameter("query", 0), Some(json!("tents")));
        assert_eq!(p.parameter("domain", 0), None);
    }

    #[test]
    fn expressions_read_from_the_item_at_index() {
        let p = params(
            json!({ "query": "={{ $json.search.text }}", "unitId": "={{$json.ids.1}}" }),
            vec![
                json!({ "search": { "text": "earbuds" }, "ids": ["a", "b"] }),
                json!({ "search": { "text": "tents" } }),
            ],
        );
        assert_eq!(p.parameter("query", 0), Some(json!("earbuds")));
        assert_eq!(p.parameter("query", 1), Some(json!("tents")));
        assert_eq!(p.parameter("unitId", 0), Some(json!("b")));
        assert_eq!(p.parameter("unitId", 1), None);
    }

    #[test]
    fn whole_item_expression() {
        let p = params(json!({ "x": "={{ $json }}" }), vec![json!({ "a": 1 })]);
        assert_eq!(p.parameter("x", 0), Some(json!({ "a": 1 })));
    }

    #[test]
    fn strings_that_merely_look_like_expressions_are_literals() {
        let p = params(json!({ "query": "{{ $json.q }}", "other": "={{ $input }}" }), vec![json!({})]);
        assert_eq!(p.parameter("query", 0), Some(json!("{{ $json.q }}")));
        assert_eq!(p.parameter("other", 0), Some(json!("={{ $input }}")));
    }

    #[test]
    fn expression_past_the_last_item_is_unset() {
        let p = params(json!({ "query": "={{ $json.q }}" }), vec![]);
        assert_eq!(p.parameter("query", 0), None);
    }
}
