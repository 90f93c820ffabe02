//! Multi-provider LLM client for knowledge extraction and generation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::{LlmConfig, ProviderKind};

/// Connection timeout for HTTP requests.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum number of retries for transient failures.
const MAX_RETRIES: u32 = 3;

/// Build an HTTP client with proper timeout configuration.
fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .expect("Failed to build HTTP client")
}

/// Determine if a request should be retried based on status code and attempt count.
fn should_retry(status_code: u16, attempt: u32) -> bool {
    if attempt >= MAX_RETRIES {
        return false;
    }
    // Retry on 5xx server errors
    (500..600).contains(&status_code)
}

/// Calculate exponential backoff duration for retry attempts.
fn calculate_backoff(attempt: u32) -> Duration {
    // Exponential backoff: 1s, 2s, 4s
    Duration::from_secs(1 << attempt)
}

/// Errors from LLM client operations.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not configured (env: {0})")]
    MissingApiKey(String),
    #[error("API request failed: {0}")]
    RequestFailed(String),
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("LLM request timed out")]
    Timeout,
}

/// Trait for LLM completion providers.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for a system prompt and user message.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

/// Anthropic messages API provider.
#[derive(Debug, Clone)]
pub struct ClaudeProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    #[must_use]
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        Self {
            client: build_http_client(),
            base_url,
            api_key,
            model,
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": system,
            "messages": [{
                "role": "user",
                "content": user
            }]
        });

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        LlmError::Timeout
                    } else {
                        LlmError::RequestFailed(e.to_string())
                    }
                })?;

            let status = response.status();
            if status.is_success() {
                let json: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| LlmError::ParseError(e.to_string()))?;

                // Extract text from the messages response format
                return json["content"][0]["text"]
                    .as_str()
                    .map(String::from)
                    .ok_or_else(|| LlmError::ParseError("No text in Claude response".to_string()));
            }

            let status_code = status.as_u16();
            if should_retry(status_code, attempt) {
                let backoff = calculate_backoff(attempt);
                tracing::warn!(status = status_code, attempt, "Retrying LLM request");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!("HTTP {status}: {text}")));
        }
    }
}

/// Gemini generateContent API provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    #[must_use]
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        Self {
            client: build_http_client(),
            base_url,
            api_key,
            model,
            max_tokens,
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": user }]
            }],
            "systemInstruction": {
                "parts": [{ "text": system }]
            },
            "generationConfig": {
                "maxOutputTokens": self.max_tokens,
                "temperature": self.temperature
            }
        });

        let mut attempt = 0;
        loop {
            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        LlmError::Timeout
                    } else {
                        LlmError::RequestFailed(e.to_string())
                    }
                })?;

            let status = response.status();
            if status.is_success() {
                let json: serde_json::Value = response
                    .json()
                    .await
                    .map_err(|e| LlmError::ParseError(e.to_string()))?;

                return json["candidates"][0]["content"]["parts"][0]["text"]
                    .as_str()
                    .map(String::from)
                    .ok_or_else(|| LlmError::ParseError("No text in Gemini response".to_string()));
            }

            let status_code = status.as_u16();
            if should_retry(status_code, attempt) {
                let backoff = calculate_backoff(attempt);
                tracing::warn!(status = status_code, attempt, "Retrying LLM request");
                tokio::time::sleep(backoff).await;
                attempt += 1;
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::RequestFailed(format!("HTTP {status}: {text}")));
        }
    }
}

/// Provider enum for dispatch.
#[derive(Debug, Clone)]
pub enum Provider {
    Claude(ClaudeProvider),
    Gemini(GeminiProvider),
}

#[async_trait]
impl LlmProvider for Provider {
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        match self {
            Self::Claude(p) => p.complete(system, user).await,
            Self::Gemini(p) => p.complete(system, user).await,
        }
    }
}

/// Client for LLM-backed knowledge operations.
pub struct LlmClient {
    provider: Box<dyn LlmProvider>,
    model: String,
}

impl LlmClient {
    /// Create a client with a specific provider implementation.
    ///
    /// Tests use this to inject mock providers.
    #[must_use]
    pub fn with_provider(provider: Box<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Create client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` if the configured API key environment
    /// variable is not set.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let provider: Box<dyn LlmProvider> = match config.provider {
            ProviderKind::Claude => Box::new(ClaudeProvider::new(
                config.base_url.clone(),
                api_key,
                config.model.clone(),
                config.max_tokens,
                config.temperature,
            )),
            ProviderKind::Gemini => Box::new(GeminiProvider::new(
                config.base_url.clone(),
                api_key,
                config.model.clone(),
                config.max_tokens,
                config.temperature,
            )),
        };

        Ok(Self {
            provider,
            model: config.model.clone(),
        })
    }

    /// Get the configured model.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a free-form text completion.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::RequestFailed` if the API request fails.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.provider.complete(system, user).await
    }

    /// Generate a completion and parse the first JSON object out of it.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::RequestFailed` if the API request fails.
    /// Returns `LlmError::ParseError` if no parseable JSON object is found.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        system: &str,
        user: &str,
    ) -> Result<T, LlmError> {
        let text = self.provider.complete(system, user).await?;
        extract_json(&text)
    }
}

/// Extract a JSON object from LLM response text.
///
/// Models frequently wrap JSON in prose or code fences; this finds the first
/// brace-balanced object and parses it into the requested type.
///
/// # Errors
///
/// Returns `LlmError::ParseError` if no JSON object is found or parsing fails.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let json_start = text
        .find('{')
        .ok_or_else(|| LlmError::ParseError(format!("No JSON object found in response: {text}")))?;

    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut json_end = json_start;
    for (i, c) in text[json_start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    json_end = json_start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    let json_str = &text[json_start..json_end];
    serde_json::from_str(json_str)
        .map_err(|e| LlmError::ParseError(format!("Failed to parse JSON: {e}")))
}
