//! `reqwest`-backed implementation of [`HttpClient`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::traits::{HttpClient, HttpRequest, HttpResponse, ResponseFormat};
use crate::HttpError;

/// Production HTTP client used by the host runtime.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Wrap an already configured `reqwest::Client`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client with a total request timeout and user agent.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

/// Append `query` to `url`, percent-encoding each name and value.
///
/// Spaces become `%20`, not `+`.
pub fn url_with_query(url: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return url.to_owned();
    }
    let encoded = query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{encoded}")
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let url = url_with_query(&request.url, &request.query);
        debug!(%url, format = ?request.response_format, "GET");

        let mut builder = self.client.get(&url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| HttpError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let decode_err = |message: String| HttpError::Decode {
            url: url.clone(),
            message,
        };

        match request.response_format {
            ResponseFormat::Json => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| decode_err(e.to_string()))?;
                let value =
                    serde_json::from_slice(&bytes).map_err(|e| decode_err(e.to_string()))?;
                Ok(HttpResponse::Json(value))
            }
            ResponseFormat::Text => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| decode_err(e.to_string()))?;
                Ok(HttpResponse::Text(text))
            }
        }
    }
}
