//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Company, ExtractionResult, Filing, Ticker};
use async_trait::async_trait;
use std::fmt::Display;

/// Classifies an error as temporary
///
/// Transient errors (network, auth, rate limits, 5xx) say nothing about the
/// filing itself and may succeed on a later run.
pub trait Transient {
    /// Whether retrying later may succeed
    fn is_transient(&self) -> bool;
}

/// Options for a single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOptions {
    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature; 0 for deterministic output
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 500,
            temperature: 0.0,
        }
    }
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (reserve-life-llm)
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: Transient + Display + Send;

    /// Generate a text completion
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, Self::Error>;

    /// Name of the model answering requests
    fn model_name(&self) -> &str;
}

/// Trait for retrieving raw filing documents
///
/// Implemented by the infrastructure layer (reserve-life-sec)
#[async_trait]
pub trait FilingSource: Send + Sync {
    /// Error type for fetch operations
    type Error: Transient + Display + Send;

    /// Fetch the document at `url` as text (HTML or plain)
    async fn fetch_document(&self, url: &str) -> Result<String, Self::Error>;
}

/// Trait for storing companies, filings and extraction results
///
/// Implemented by the infrastructure layer (reserve-life-store). Every
/// mutation is durable when it returns `Ok`.
pub trait CompanyStore {
    /// Error type for store operations
    type Error: Display;

    /// Add a company; the ticker must not exist yet
    fn add_company(&mut self, company: Company) -> Result<(), Self::Error>;

    /// Remove a company and all its filings
    fn remove_company(&mut self, ticker: &Ticker) -> Result<Company, Self::Error>;

    /// Get a company by ticker
    fn get_company(&self, ticker: &Ticker) -> Option<&Company>;

    /// All companies, ordered by ticker
    fn list_companies(&self) -> Vec<&Company>;

    /// Add filings not yet known by accession; existing filings are untouched
    ///
    /// Returns the number of filings added.
    fn merge_filings(&mut self, ticker: &Ticker, filings: Vec<Filing>)
        -> Result<usize, Self::Error>;

    /// Record the SEC central index key of a company
    fn set_cik(&mut self, ticker: &Ticker, cik: &str) -> Result<(), Self::Error>;

    /// Attach an extraction result to a filing
    ///
    /// Returns whether the stored result changed (see
    /// [`Filing::attach_extraction`]).
    fn attach_extraction(
        &mut self,
        ticker: &Ticker,
        accession: &str,
        result: ExtractionResult,
    ) -> Result<bool, Self::Error>;
}
