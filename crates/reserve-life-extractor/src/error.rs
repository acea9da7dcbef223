//! Error types for the Extractor
//!
//! Extraction of a single filing never fails: every problem becomes an
//! `ExtractionResult::Failure`. These errors cover setup and bookkeeping
//! around it.

use thiserror::Error;

/// Errors that can occur around extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Company is not in the store
    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    /// Filing is not in the store
    #[error("Filing not found: {ticker} {accession}")]
    FilingNotFound {
        /// Company ticker
        ticker: String,
        /// Accession number
        accession: String,
    },

    /// Store error while persisting a result
    #[error("Store error: {0}")]
    Store(String),
}
