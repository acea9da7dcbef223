//! Perplexity Provider Implementation
//!
//! Talks to the Perplexity chat completions API
//! (`POST {endpoint}/chat/completions`, bearer auth).
//!
//! # Features
//!
//! - Credential checked once at construction
//! - Configurable endpoint, model and timeout
//! - Retry with exponential backoff for network errors, 429 and 5xx
//!
//! # Examples
//!
//! ```no_run
//! use reserve_life_llm::PerplexityProvider;
//!
//! let provider = PerplexityProvider::from_env()
//!     .expect("PERPLEXITY_API_KEY is set")
//!     .with_model("sonar-pro");
//! ```

use crate::LlmError;
use async_trait::async_trait;
use reserve_life_domain::traits::{GenerationOptions, LlmProvider};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Default Perplexity API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai";

/// Default model
pub const DEFAULT_MODEL: &str = "sonar-pro";

/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "PERPLEXITY_API_KEY";

/// Default timeout for LLM requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of attempts per request
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Perplexity API provider
pub struct PerplexityProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
    max_retries: u32,
    backoff: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl PerplexityProvider {
    /// Create a provider with the given API key
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingCredential` if the key is absent or blank.
    pub fn new(api_key: Option<String>) -> Result<Self, LlmError> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LlmError::MissingCredential(API_KEY_VAR.to_string()))?;

        Ok(Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        })
    }

    /// Create a provider reading the key from `PERPLEXITY_API_KEY`
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(std::env::var(API_KEY_VAR).ok())
    }

    /// Set the API endpoint (without the `/chat/completions` suffix)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Set the delay before the first retry; later retries double it
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self, LlmError> {
        self.client = build_client(timeout_secs)?;
        self.timeout_secs = timeout_secs;
        Ok(self)
    }

    async fn send_once(&self, prompt: &str, options: &GenerationOptions) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| self.request_error(e))?;
            return extract_content(&text);
        }

        let detail = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(status_error(status, &self.model, &detail))
    }

    fn request_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.timeout_secs)
        } else {
            LlmError::Communication(format!("Request failed: {}", error))
        }
    }
}

#[async_trait]
impl LlmProvider for PerplexityProvider {
    type Error = LlmError;

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, Self::Error> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            debug!(model = %self.model, attempt = attempts, "Querying LLM");

            let error = match self.send_once(prompt, options).await {
                Ok(text) => {
                    debug!(chars = text.len(), "LLM responded");
                    return Ok(text);
                }
                Err(e) => e,
            };

            if !should_retry(&error) || attempts >= self.max_retries {
                return Err(error);
            }

            let delay = retry_delay(self.backoff, attempts);
            warn!(error = %error, delay_ms = delay.as_millis() as u64, "LLM request failed, retrying");
            tokio::time::sleep(delay).await;
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn build_client(timeout_secs: u64) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| LlmError::Other(format!("Failed to build HTTP client: {}", e)))
}

/// Exponential backoff: base, 2×base, 4×base, ... saturating at the maximum
fn retry_delay(backoff: Duration, attempt: u32) -> Duration {
    backoff.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
}

fn should_retry(error: &LlmError) -> bool {
    matches!(
        error,
        LlmError::Communication(_) | LlmError::Timeout(_) | LlmError::RateLimitExceeded
    )
}

fn status_error(status: StatusCode, model: &str, detail: &str) -> LlmError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            LlmError::Auth(format!("HTTP {}", status))
        }
        StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded,
        StatusCode::NOT_FOUND => LlmError::ModelNotAvailable(model.to_string()),
        s if s.is_server_error() => LlmError::Communication(format!("HTTP {}: {}", s, detail)),
        s => LlmError::InvalidResponse(format!("HTTP {}: {}", s, detail)),
    }
}

/// Pull the first choice's message text out of a completions response body
fn extract_content(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default().trim().to_string())
        .ok_or_else(|| LlmError::InvalidResponse("Response has no choices".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reserve_life_domain::traits::Transient;

    fn provider() -> PerplexityProvider {
        PerplexityProvider::new(Some("test-key".to_string())).unwrap()
    }

    #[test]
    fn test_provider_creation() {
        let provider = provider();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model_name(), DEFAULT_MODEL);
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_retry_delay_doubles_and_saturates() {
        let base = Duration::from_millis(500);
        assert_eq!(retry_delay(base, 1), base);
        assert_eq!(retry_delay(base, 3), Duration::from_secs(2));
        assert_eq!(retry_delay(base, 40), base * u32::MAX);
        assert_eq!(retry_delay(Duration::MAX, 2), Duration::MAX);
    }

    #[test]
    fn test_missing_credential() {
        assert!(matches!(
            PerplexityProvider::new(None),
            Err(LlmError::MissingCredential(_))
        ));
        assert!(matches!(
            PerplexityProvider::new(Some("   ".to_string())),
            Err(LlmError::MissingCredential(_))
        ));
    }

    #[test]
    fn test_builder_settings() {
        let provider = provider()
            .with_endpoint("http://localhost:8080/")
            .with_model("sonar")
            .with_max_retries(0);
        assert_eq!(provider.endpoint, "http://localhost:8080");
        assert_eq!(provider.model, "sonar");
        assert_eq!(provider.max_retries, 1);
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  {\"a\": 1}\n"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "{\"a\": 1}");

        assert!(matches!(
            extract_content(r#"{"choices":[]}"#),
            Err(LlmError::InvalidResponse(_))
        ));
        assert!(matches!(
            extract_content("<html>"),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "m", ""),
            LlmError::Auth(_)
        ));
        assert_eq!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "m", ""),
            LlmError::RateLimitExceeded
        );
        assert!(status_error(StatusCode::BAD_GATEWAY, "m", "").is_transient());
        assert!(!status_error(StatusCode::BAD_REQUEST, "m", "").is_transient());
    }

    #[test]
    fn test_auth_errors_not_retried() {
        assert!(!should_retry(&LlmError::Auth("HTTP 401".into())));
        assert!(should_retry(&LlmError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let provider = provider()
            .with_endpoint("http://127.0.0.1:9")
            .with_max_retries(1);

        let result = provider.generate("test", &GenerationOptions::default()).await;
        let error = result.unwrap_err();
        assert!(matches!(error, LlmError::Communication(_)));
        assert!(error.is_transient());
    }
}
