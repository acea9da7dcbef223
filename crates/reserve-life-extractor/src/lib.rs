//! Reserve Life Extractor
//!
//! Pulls proved crude oil reserves and annual production out of SEC filings
//! with an LLM.
//!
//! # Architecture
//!
//! ```text
//! Filing → FilingSource → ContentReducer → PromptBuilder → LlmProvider
//!        → parser → unit normalizer → ExtractionResult → CompanyStore
//! ```
//!
//! A filing document is far larger than an LLM context, so the
//! [`ContentReducer`] keeps only the tables and paragraphs that mention
//! reserves or production. The model answers in the filing's own units and
//! the figures are converted to barrels afterwards.
//!
//! Extraction of a single filing never returns an error: fetch problems,
//! LLM outages and unreadable answers all become an
//! [`ExtractionResult::Failure`](reserve_life_domain::ExtractionResult) with
//! an audit log.
//!
//! # Example Usage
//!
//! ```no_run
//! use reserve_life_extractor::{BatchOptions, Extractor, ExtractorConfig};
//! use reserve_life_llm::PerplexityProvider;
//! use reserve_life_sec::{EdgarClient, EdgarConfig};
//! use reserve_life_store::JsonStore;
//! use std::sync::atomic::AtomicBool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let source = EdgarClient::new(EdgarConfig::default())?;
//! let llm = PerplexityProvider::from_env()?;
//! let extractor = Extractor::new(source, llm, ExtractorConfig::default())?;
//!
//! let mut store = JsonStore::open("companies.json")?;
//! let report = extractor
//!     .extract_all(&mut store, &BatchOptions::default(), &AtomicBool::new(false))
//!     .await;
//!
//! println!("Extracted: {}", report.extracted);
//! println!("Unavailable: {}", report.unavailable);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod reducer;
mod types;

#[cfg(test)]
mod tests;

pub use config::{ExtractorConfig, DEFAULT_KEYWORDS};
pub use error::ExtractorError;
pub use extractor::{needs_extraction, Extractor};
pub use parser::{parse_llm_response, ParsedResponse, RawFigures};
pub use prompt::PromptBuilder;
pub use reducer::{ContentReducer, Excerpt};
pub use types::{BatchOptions, BatchReport, FilingOutcome, OutcomeStatus};
