//! Thin wrapper over the catalog service's REST endpoints.

use serde_json::Value;

use super::credentials::KnowledgelibCredentials;
use crate::traits::{HttpClient, HttpRequest};
use crate::HttpError;

const ACCEPT_JSON: &str = "application/json";
const ACCEPT_MARKDOWN: &str = "text/markdown";

/// Binds an HTTP client to one base URL and auth header set.
pub struct CatalogApi<'a> {
    http: &'a dyn HttpClient,
    base_url: String,
    auth: Vec<(String, String)>,
}

impl<'a> CatalogApi<'a> {
    pub fn new(http: &'a dyn HttpClient, credentials: &KnowledgelibCredentials) -> Self {
        Self {
            http,
            base_url: credentials.api_url.trim_end_matches('/').to_owned(),
            auth: credentials.auth_headers(),
        }
    }

    fn request(&self, path: &str, accept: &str) -> HttpRequest {
        HttpRequest::get(format!("{}{}", self.base_url, path))
            .headers(self.auth.iter().cloned())
            .header("Accept", accept)
    }

    /// `GET /api/v1/query`; `domain` is sent only when present.
    pub async fn query(
        &self,
        query: &str,
        limit: u64,
        domain: Option<&str>,
    ) -> Result<Value, HttpError> {
        let mut request = self
            .request("/api/v1/query", ACCEPT_JSON)
            .query("q", query)
            .query("limit", limit);
        if let Some(domain) = domain {
            request = request.query("domain", domain);
        }
        Ok(self.http.send(request).await?.into_json())
    }

    /// `GET /api/v1/units/{id}.json`
    pub async fn unit_json(&self, unit_id: &str) -> Result<Value, HttpError> {
        let request = self.request(&format!("/api/v1/units/{unit_id}.json"), ACCEPT_JSON);
        Ok(self.http.send(request).await?.into_json())
    }

    /// `GET /api/v1/units/{id}.md`
    pub async fn unit_markdown(&self, unit_id: &str) -> Result<String, HttpError> {
        let request = self
            .request(&format!("/api/v1/units/{unit_id}.md"), ACCEPT_MARKDOWN)
            .text();
        Ok(self.http.send(request).await?.into_text())
    }

    /// `GET /catalog.json`
    pub async fn catalog(&self) -> Result<Value, HttpError> {
        let request = self.request("/catalog.json", ACCEPT_JSON);
        Ok(self.http.send(request).await?.into_json())
    }
}

/// Check that `credentials` reach the service by fetching the catalog.
pub async fn test_credentials(
    http: &dyn HttpClient,
    credentials: &KnowledgelibCredentials,
) -> Result<(), HttpError> {
    CatalogApi::new(http, credentials).catalog().await.map(|_| ())
}
