//! The Knowledgelib node: per-item dispatch over the three operations.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};

use super::api::CatalogApi;
use super::credentials::KnowledgelibCredentials;
use super::params::{OperationParameters, ParameterReader, UnitFormat};
use crate::traits::{ExecutionContext, OutputItem};
use crate::{ExecutableNode, NodeError};

/// Forwards parameters to the catalog service and reshapes its answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgelibNode;

impl KnowledgelibNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExecutableNode for KnowledgelibNode {
    #[instrument(skip_all, fields(execution_id = %ctx.execution_id, items = ctx.item_count))]
    async fn execute(&self, ctx: &ExecutionContext) -> Result<Vec<OutputItem>, NodeError> {
        if ctx.item_count == 0 {
            return Ok(Vec::new());
        }

        let reader = ParameterReader::new(ctx.parameters.as_ref());
        let operation = reader.operation()?;
        let credentials = KnowledgelibCredentials::resolve(ctx.credentials.as_ref()).await;
        let api = CatalogApi::new(ctx.http.as_ref(), &credentials);

        info!(%operation, api_url = %credentials.api_url, "executing knowledgelib node");

        let mut output = Vec::with_capacity(ctx.item_count);
        for item_index in 0..ctx.item_count {
            let result = match reader.parameters(operation, item_index) {
                Ok(params) => run_item(&api, params).await,
                Err(err) => Err(err),
            };

            match result {
                Ok(json) => output.push(OutputItem::new(json, item_index)),
                Err(err) if ctx.continue_on_fail => {
                    warn!(item_index, error = %err, "item failed, continuing");
                    output.push(OutputItem::new(json!({ "error": err.to_string() }), item_index));
                }
                Err(err) => {
                    error!(item_index, error = %err, "item failed, aborting batch");
                    return Err(err.at_item(item_index));
                }
            }
        }

        info!(records = output.len(), "knowledgelib node finished");
        Ok(output)
    }
}

async fn run_item(api: &CatalogApi<'_>, params: OperationParameters) -> Result<Value, NodeError> {
    match params {
        OperationParameters::Query {
            query,
            limit,
            domain,
            fetch_full_content,
        } => {
            let mut response = api.query(&query, limit, domain.as_deref()).await?;
            if fetch_full_content {
                attach_full_content(api, &mut response).await;
            }
            Ok(response)
        }
        OperationParameters::GetUnit {
            unit_id,
            format: UnitFormat::Json,
        } => Ok(api.unit_json(&unit_id).await?),
        OperationParameters::GetUnit {
            unit_id,
            format: UnitFormat::Markdown,
        } => {
            let content = api.unit_markdown(&unit_id).await?;
            Ok(json!({ "id": unit_id, "format": "markdown", "content": content }))
        }
        OperationParameters::ListDomains => {
            let catalog = api.catalog().await?;
            Ok(json!({
                "total_units": catalog.get("total_units").cloned().unwrap_or(Value::Null),
                "domains": catalog.get("domains").cloned().unwrap_or(Value::Null),
            }))
        }
    }
}

fn unit_id_of(hit: &Value) -> Option<String> {
    match hit.get("id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Set `full_content` on every object in `response.results`.
///
/// A failed fetch leaves `null` for that hit only; it never fails the item.
async fn attach_full_content(api: &CatalogApi<'_>, response: &mut Value) {
    let Some(results) = response.get_mut("results").and_then(Value::as_array_mut) else {
        return;
    };

    for hit in results.iter_mut() {
        let content = match unit_id_of(hit) {
            Some(id) => match api.unit_markdown(&id).await {
                Ok(markdown) => Value::String(markdown),
                Err(err) => {
                    warn!(unit_id = %id, error = %err, "full content fetch failed");
                    Value::Null
                }
            },
            None => {
                debug!("search hit without id, no full content");
                Value::Null
            }
        };

        if let Some(obj) = hit.as_object_mut() {
            obj.insert("full_content".to_owned(), content);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{context, MockHttpClient, StaticCredentials, StaticParameters};
    use crate::HttpError;

    const ROOT: &str = "https://knowledgelib.io";

    fn search_body() -> Value {
        json!({
            "query": "wireless earbuds",
            "total": 2,
            "results": [
                { "id": "audio/earbuds/2026", "title": "Earbuds", "score": 0.9 },
                { "id": "audio/headphones/2026", "title": "Headphones", "score": 0.7 }
            ]
        })
    }

    #[tokio::test]
    async fn query_issues_one_request_and_emits_body_unchanged() {
        let http = MockHttpClient::new().json(
            format!("{ROOT}/api/v1/query?q=wireless%20earbuds&limit=5"),
            search_body(),
        );
        let ctx = context(
            1,
            false,
            StaticParameters::new(json!({
                "operation": "query",
                "query": "wireless earbuds",
                "limit": 5,
                "domain": "",
                "fetchFullContent": false,
            })),
            StaticCredentials::not_configured(),
            http.clone(),
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();

        assert_eq!(out, vec![OutputItem::new(search_body(), 0)]);
        assert_eq!(
            http.requested_urls(),
            vec![format!("{ROOT}/api/v1/query?q=wireless%20earbuds&limit=5")]
        );
        let req = &http.requests()[0];
        assert!(!req.headers.iter().any(|(k, _)| k == "Authorization"));
    }

    #[tokio::test]
    async fn enrichment_failure_only_nulls_that_hit() {
        let http = MockHttpClient::new()
            .json(format!("{ROOT}/api/v1/query?q=earbuds&limit=20&domain=audio"), search_body())
            .text(format!("{ROOT}/api/v1/units/audio/earbuds/2026.md"), "# Earbuds")
            .status(format!("{ROOT}/api/v1/units/audio/headphones/2026.md"), 500);
        let ctx = context(
            1,
            false,
            StaticParameters::new(json!({
                "query": "earbuds",
                "domain": "audio",
                "fetchFullContent": true,
            })),
            StaticCredentials::not_configured(),
            http.clone(),
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();

        assert_eq!(out.len(), 1);
        let results = out[0].json["results"].as_array().unwrap();
        assert_eq!(results[0]["full_content"], "# Earbuds");
        assert_eq!(results[0]["title"], "Earbuds");
        assert_eq!(results[1]["full_content"], Value::Null);
        assert_eq!(out[0].json["total"], 2);
        assert_eq!(http.call_count(), 3);
    }

    #[tokio::test]
    async fn hits_without_id_get_null_without_a_request() {
        let http = MockHttpClient::new().json(
            format!("{ROOT}/api/v1/query?q=x&limit=20"),
            json!({ "results": [{ "title": "no id" }] }),
        );
        let ctx = context(
            1,
            false,
            StaticParameters::new(json!({ "query": "x", "fetchFullContent": true })),
            StaticCredentials::not_configured(),
            http.clone(),
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();
        assert!(out[0].json["results"][0]
            .as_object()
            .unwrap()
            .get("full_content")
            .is_some_and(Value::is_null));
        assert_eq!(http.call_count(), 1);
    }

    #[tokio::test]
    async fn get_unit_json_is_emitted_verbatim() {
        let body = json!({ "id": "a/b", "frontmatter": { "title": "B" }, "body": "..." });
        let http = MockHttpClient::new().json(format!("{ROOT}/api/v1/units/a/b.json"), body.clone());
        let ctx = context(
            1,
            false,
            StaticParameters::new(json!({ "operation": "getUnit", "unitId": "a/b", "format": "json" })),
            StaticCredentials::not_configured(),
            http,
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();
        assert_eq!(out[0].json, body);
    }

    #[tokio::test]
    async fn get_unit_markdown_is_wrapped() {
        let http = MockHttpClient::new().text(format!("{ROOT}/api/v1/units/a/b.md"), "# B\n");
        let ctx = context(
            1,
            false,
            StaticParameters::new(json!({ "operation": "getUnit", "unitId": "a/b", "format": "md" })),
            StaticCredentials::not_configured(),
            http,
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();
        assert_eq!(
            out[0].json,
            json!({ "id": "a/b", "format": "markdown", "content": "# B\n" })
        );
    }

    #[tokio::test]
    async fn list_domains_keeps_only_summary_fields_for_every_item() {
        let http = MockHttpClient::new().json(
            format!("{ROOT}/catalog.json"),
            json!({ "total_units": 42, "domains": ["home", "fitness"], "generated_at": "2026-01-01" }),
        );
        let ctx = context(
            3,
            false,
            StaticParameters::new(json!({ "operation": "listDomains" })),
            StaticCredentials::not_configured(),
            http.clone(),
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();
        assert_eq!(out.len(), 3);
        for (i, item) in out.iter().enumerate() {
            assert_eq!(item.paired_item, i);
            assert_eq!(item.json, json!({ "total_units": 42, "domains": ["home", "fitness"] }));
        }
        assert_eq!(http.call_count(), 3);
    }

    #[tokio::test]
    async fn stored_credentials_set_base_url_and_bearer_token() {
        let http = MockHttpClient::new().json("https://self.hosted/catalog.json", json!({}));
        let ctx = context(
            1,
            false,
            StaticParameters::new(json!({ "operation": "listDomains" })),
            StaticCredentials::returning(json!({ "apiUrl": "https://self.hosted", "apiKey": "abc" })),
            http.clone(),
        );

        KnowledgelibNode::new().execute(&ctx).await.unwrap();
        let req = &http.requests()[0];
        assert!(req.headers.contains(&("Authorization".into(), "Bearer abc".into())));
    }

    #[tokio::test]
    async fn continue_on_fail_emits_error_record_and_keeps_going() {
        let http = MockHttpClient::new()
            .text(format!("{ROOT}/api/v1/units/ok/1.md"), "one")
            .status(format!("{ROOT}/api/v1/units/missing.md"), 404)
            .text(format!("{ROOT}/api/v1/units/ok/3.md"), "three");
        let ctx = context(
            3,
            true,
            StaticParameters::new(json!({ "operation": "getUnit" }))
                .with_item(0, json!({ "unitId": "ok/1" }))
                .with_item(1, json!({ "unitId": "missing" }))
                .with_item(2, json!({ "unitId": "ok/3" })),
            StaticCredentials::not_configured(),
            http,
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].json["content"], "one");
        assert_eq!(out[1].paired_item, 1);
        assert!(out[1].json["error"].as_str().unwrap().contains("404"));
        assert_eq!(out[1].json.as_object().unwrap().len(), 1);
        assert_eq!(out[2].json["content"], "three");
    }

    #[tokio::test]
    async fn failure_without_continue_aborts_with_item_index() {
        let http = MockHttpClient::new()
            .text(format!("{ROOT}/api/v1/units/ok/1.md"), "one")
            .status(format!("{ROOT}/api/v1/units/missing.md"), 404);
        let ctx = context(
            3,
            false,
            StaticParameters::new(json!({ "operation": "getUnit", "unitId": "never" }))
                .with_item(0, json!({ "unitId": "ok/1" }))
                .with_item(1, json!({ "unitId": "missing" })),
            StaticCredentials::not_configured(),
            http.clone(),
        );

        let err = KnowledgelibNode::new().execute(&ctx).await.unwrap_err();
        match err {
            NodeError::ItemFailed { item_index, source } => {
                assert_eq!(item_index, 1);
                assert!(matches!(*source, NodeError::Http(HttpError::Status { status: 404, .. })));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Item 2 was never attempted.
        assert_eq!(http.call_count(), 2);
    }

    #[tokio::test]
    async fn credential_store_failure_still_completes_against_public_root() {
        let http = MockHttpClient::new().json(
            format!("{ROOT}/catalog.json"),
            json!({ "total_units": 7, "domains": ["home"] }),
        );
        let ctx = context(
            2,
            false,
            StaticParameters::new(json!({ "operation": "listDomains" })),
            StaticCredentials::failing("vault sealed"),
            http.clone(),
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[1].json, json!({ "total_units": 7, "domains": ["home"] }));
        assert_eq!(
            http.requested_urls(),
            vec![format!("{ROOT}/catalog.json"), format!("{ROOT}/catalog.json")]
        );
        assert!(http
            .requests()
            .iter()
            .all(|r| r.headers.iter().all(|(k, _)| k != "Authorization")));
    }

    #[tokio::test]
    async fn non_string_domain_fails_the_item_instead_of_dropping_the_filter() {
        let http = MockHttpClient::new()
            .json(format!("{ROOT}/api/v1/query?q=q&limit=20&domain=home"), json!({ "results": [] }));
        let params = StaticParameters::new(json!({ "query": "q" }))
            .with_item(0, json!({ "domain": ["home"] }))
            .with_item(1, json!({ "domain": "home" }));

        let ctx = context(2, true, params.clone(), StaticCredentials::not_configured(), http.clone());
        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();

        assert!(out[0].json["error"]
            .as_str()
            .unwrap()
            .starts_with("invalid parameter 'domain'"));
        assert_eq!(out[1].json, json!({ "results": [] }));
        // No unfiltered query was sent for item 0.
        assert_eq!(
            http.requested_urls(),
            vec![format!("{ROOT}/api/v1/query?q=q&limit=20&domain=home")]
        );

        let ctx = context(2, false, params, StaticCredentials::not_configured(), MockHttpClient::new());
        let err = KnowledgelibNode::new().execute(&ctx).await.unwrap_err();
        assert!(matches!(
            err,
            NodeError::ItemFailed { item_index: 0, ref source }
                if matches!(**source, NodeError::InvalidParameter { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_parameters_are_per_item_failures() {
        let ctx = context(
            1,
            true,
            StaticParameters::new(json!({ "operation": "getUnit", "unitId": "" })),
            StaticCredentials::not_configured(),
            MockHttpClient::new(),
        );

        let out = KnowledgelibNode::new().execute(&ctx).await.unwrap();
        assert_eq!(out[0].json, json!({ "error": "missing parameter 'unitId'" }));
    }

    #[tokio::test]
    async fn unknown_operation_fails_the_batch() {
        let ctx = context(
            2,
            true,
            StaticParameters::new(json!({ "operation": "purge" })),
            StaticCredentials::not_configured(),
            MockHttpClient::new(),
        );

        let err = KnowledgelibNode::new().execute(&ctx).await.unwrap_err();
        assert_eq!(err, NodeError::UnknownOperation("purge".into()));
    }

    #[tokio::test]
    async fn empty_batch_makes_no_requests() {
        let http = MockHttpClient::new();
        let ctx = context(
            0,
            false,
            StaticParameters::new(json!({ "operation": "listDomains" })),
            StaticCredentials::not_configured(),
            http.clone(),
        );

        assert!(KnowledgelibNode::new().execute(&ctx).await.unwrap().is_empty());
        assert_eq!(http.call_count(), 0);
    }
}
