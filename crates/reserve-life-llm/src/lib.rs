//! Reserve Life LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `reserve-life-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing and fixture data
//! - `PerplexityProvider`: Perplexity chat completions API
//!
//! # Examples
//!
//! ```
//! use reserve_life_llm::MockProvider;
//! use reserve_life_domain::traits::{GenerationOptions, LlmProvider};
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new("Hello from LLM!");
//! let result = rt
//!     .block_on(provider.generate("test prompt", &GenerationOptions::default()))
//!     .unwrap();
//! assert_eq!(result, "Hello from LLM!");
//! ```

#![warn(missing_docs)]

pub mod perplexity;

use async_trait::async_trait;
use reserve_life_domain::traits::{GenerationOptions, LlmProvider, Transient};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub use perplexity::PerplexityProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request did not complete in time
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credential rejected (401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// No API credential configured
    #[error("Missing API credential: set {0}")]
    MissingCredential(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl Transient for LlmError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_)
                | LlmError::Timeout(_)
                | LlmError::RateLimitExceeded
                | LlmError::Auth(_)
                | LlmError::ModelNotAvailable(_)
        )
    }
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(LlmError),
}

/// Mock LLM provider for deterministic testing
///
/// Returns pre-configured responses without making any network calls.
/// A configured reply is used when its key occurs anywhere in the prompt;
/// otherwise the default response is returned.
///
/// # Examples
///
/// ```
/// use reserve_life_llm::{LlmError, MockProvider};
/// use reserve_life_domain::traits::{GenerationOptions, LlmProvider};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let options = GenerationOptions::default();
///
/// let mut provider = MockProvider::default();
/// provider.add_response("ACME", "{\"reserves_barrels\": null}");
/// provider.add_error("FAIL", LlmError::RateLimitExceeded);
///
/// let reply = rt.block_on(provider.generate("excerpt for ACME", &options)).unwrap();
/// assert!(reply.contains("reserves_barrels"));
/// assert!(rt.block_on(provider.generate("FAIL", &options)).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    call_count: Arc<Mutex<usize>>,
    last_prompt: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            last_prompt: Arc::new(Mutex::new(None)),
        }
    }

    /// Add a response for prompts containing `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        self.push(key.into(), MockReply::Text(response.into()));
    }

    /// Fail prompts containing `key` with the given error
    pub fn add_error(&mut self, key: impl Into<String>, error: LlmError) {
        self.push(key.into(), MockReply::Fail(error));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) = 0;
    }

    /// The most recent prompt received
    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&mut self, key: String, reply: MockReply) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((key, reply));
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        *self.last_prompt.lock().unwrap_or_else(PoisonError::into_inner) = Some(prompt.to_string());

        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        let reply = responses
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(error)) => Err(error),
            None => Ok(self.default_response.clone()),
        }
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}
