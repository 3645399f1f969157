//! Generative-model service client
//!
//! Single-operation client for a Gemini-style generateContent API. The
//! caller supplies the model name per request; candidate ordering and
//! fallthrough live in the extraction stage, not here.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GenAiConfig;

/// Environment variable consulted when no API key is configured
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Errors from the generative-model service
#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model service returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("configuration error: {0}")]
    Config(String),
}

/// Client for the external generative-model service
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Run one generation request against the named model.
    ///
    /// With `json_mode`, the service is asked to respond with pure JSON.
    /// Returns the response text; an empty string means the model produced
    /// no usable output (callers decide whether that is a failure).
    async fn generate(&self, model: &str, prompt: &str, json_mode: bool)
        -> Result<String, GenAiError>;
}

/// HTTP implementation of [`GenerativeClient`]
pub struct HttpGenerativeClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpGenerativeClient {
    pub fn new(config: &GenAiConfig) -> Result<Self, GenAiError> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .unwrap_or_default();
        if api_key.is_empty() {
            warn!("No model service API key configured ({} unset)", API_KEY_ENV);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| GenAiError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

#[async_trait]
impl GenerativeClient for HttpGenerativeClient {
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        json_mode: bool,
    ) -> Result<String, GenAiError> {
        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        if json_mode {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        debug!("Generating with model {}", model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenAiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: Value = response.json().await?;
        Ok(text_from_response(&parsed).unwrap_or_default())
    }
}

/// Pull the first candidate's text out of a generation response.
///
/// The response nesting is deep and not guaranteed; missing pieces yield
/// None rather than an error so the caller can treat it as an empty reply.
fn text_from_response(response: &Value) -> Option<String> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
}
