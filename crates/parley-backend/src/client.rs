use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::traits::BackendClient;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub message: String,
}

/// Body returned by `POST /query`; fields other than `response` are ignored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Backend client (plain JSON over HTTP)
pub struct HttpBackendClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn query_url(&self) -> String {
        format!("{}/query", self.base_url)
    }
}

#[async_trait]
impl BackendClient for HttpBackendClient {
    async fn query(&self, message: &str) -> Result<String, BackendError> {
        let payload = QueryRequest {
            message: message.to_string(),
        };

        let response = self
            .http_client
            .post(self.query_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = %status, "Backend returned an error status");
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = serde_json::from_str(&body)
            .map_err(|e| BackendError::Decode(e.to_string()))?;

        tracing::debug!(reply_len = parsed.response.len(), "Backend replied");
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_strips_trailing_slash() {
        let client = HttpBackendClient::new(BackendConfig::new("http://backend:5000/")).unwrap();
        assert_eq!(client.query_url(), "http://backend:5000/query");
    }

    #[test]
    fn test_response_ignores_extra_fields() {
        let body = r#"{"response": "You said: hi", "status": "ok", "mock": true}"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.response, "You said: hi");
    }
}
