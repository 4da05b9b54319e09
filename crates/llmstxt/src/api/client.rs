//! REST client for the generation service.
//!
//! Wraps `POST /generate` and `GET /result` using [`reqwest`].

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};

use super::types::{GenerateRequest, StatusResponse};
use super::GenerationBackend;
use crate::config::ClientConfig;
use crate::error::ApiError;

/// Maximum length for error bodies kept in [`ApiError::Status`].
const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// HTTP client for one generation service instance.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    api_base: String,
}

impl BackendClient {
    /// Creates a client with the timeouts from `config`.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder().connect_timeout(config.connect_timeout());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Self::with_client(builder.build()?, &config.api_base)
    }

    /// Creates a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: Client, api_base: &str) -> Result<Self, ApiError> {
        Url::parse(api_base).map_err(|_| ApiError::InvalidBaseUrl(api_base.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Fails with [`ApiError::Status`] on any non-2xx response.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerationBackend for BackendClient {
    async fn submit(&self, target: &str) -> Result<(), ApiError> {
        debug!("POST {} for {}", self.endpoint("generate"), target);

        let response = self
            .client
            .post(self.endpoint("generate"))
            .json(&GenerateRequest {
                url: target.to_string(),
            })
            .send()
            .await?;

        // The body echoes job state but carries nothing the client needs.
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_status(&self, target: &str) -> Result<StatusResponse, ApiError> {
        let response = self
            .client
            .get(self.endpoint("result"))
            .query(&[("url", target)])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
