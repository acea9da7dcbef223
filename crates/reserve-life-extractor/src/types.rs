//! Request and report types for batch extraction

use reserve_life_domain::{ExtractionResult, FailureKind, Ticker};
use serde::Serialize;

/// Options for a batch run
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Re-run filings that already have a final result
    pub force: bool,

    /// Restrict the run to one company
    pub ticker: Option<Ticker>,
}

impl BatchOptions {
    /// Re-run everything
    pub fn forced() -> Self {
        Self {
            force: true,
            ticker: None,
        }
    }
}

/// What happened to one filing during a batch run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Both figures extracted
    Extracted,
    /// Extraction finished with a failure of this kind
    Failed(FailureKind),
    /// Already had a final result
    Skipped,
    /// Result could not be persisted
    StoreError(String),
}

/// Per-filing entry of a [`BatchReport`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingOutcome {
    /// Company ticker
    pub ticker: Ticker,
    /// Accession number
    pub accession: String,
    /// Outcome
    pub status: OutcomeStatus,
}

/// Summary of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Per-filing outcomes, in processing order
    pub outcomes: Vec<FilingOutcome>,
    /// Filings with a successful extraction
    pub extracted: usize,
    /// Filings where the model found no figures
    pub no_data: usize,
    /// Filings whose response could not be parsed
    pub malformed: usize,
    /// Filings whose fetch or LLM call was unavailable
    pub unavailable: usize,
    /// Filings skipped because they already had a final result
    pub skipped: usize,
    /// Results that could not be persisted
    pub store_errors: usize,
    /// Whether the run was stopped before finishing
    pub stopped: bool,
}

impl BatchReport {
    /// Number of filings extraction was attempted on
    pub fn attempted(&self) -> usize {
        self.extracted + self.no_data + self.malformed + self.unavailable
    }

    pub(crate) fn record_skip(&mut self, ticker: &Ticker, accession: &str) {
        self.skipped += 1;
        self.push(ticker, accession, OutcomeStatus::Skipped);
    }

    pub(crate) fn record_result(
        &mut self,
        ticker: &Ticker,
        accession: &str,
        result: &ExtractionResult,
    ) {
        let status = match result.failure_kind() {
            None => {
                self.extracted += 1;
                OutcomeStatus::Extracted
            }
            Some(kind) => {
                match kind {
                    FailureKind::NoData => self.no_data += 1,
                    FailureKind::MalformedResponse => self.malformed += 1,
                    FailureKind::UpstreamUnavailable => self.unavailable += 1,
                }
                OutcomeStatus::Failed(kind)
            }
        };
        self.push(ticker, accession, status);
    }

    pub(crate) fn record_store_error(&mut self, ticker: &Ticker, accession: &str, error: String) {
        self.store_errors += 1;
        self.push(ticker, accession, OutcomeStatus::StoreError(error));
    }

    fn push(&mut self, ticker: &Ticker, accession: &str, status: OutcomeStatus) {
        self.outcomes.push(FilingOutcome {
            ticker: ticker.clone(),
            accession: accession.to_string(),
            status,
        });
    }
}
