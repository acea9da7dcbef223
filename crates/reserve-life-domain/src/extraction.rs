//! Extraction results and their audit log

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an extraction produced no usable figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Filing archive or LLM could not be reached (network, auth, rate limit)
    UpstreamUnavailable,

    /// No relevant content in the filing, or the model found no figures
    NoData,

    /// The model answered with JSON of the wrong shape or types
    MalformedResponse,
}

impl FailureKind {
    /// Whether a later run may succeed on the same filing
    pub fn is_retryable(&self) -> bool {
        matches!(self, FailureKind::UpstreamUnavailable)
    }

    /// Get the kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::UpstreamUnavailable => "upstream_unavailable",
            FailureKind::NoData => "no_data",
            FailureKind::MalformedResponse => "malformed_response",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, human-readable record of the steps taken for one extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionLog {
    entries: Vec<String>,
}

impl ExtractionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message
    pub fn note(&mut self, message: impl Into<String>) {
        self.entries.push(message.into());
    }

    /// Append every message from another log
    pub fn extend(&mut self, other: ExtractionLog) {
        self.entries.extend(other.entries);
    }

    /// Logged messages, oldest first
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Whether nothing has been logged
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the log into its messages
    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

/// Outcome of extracting proved reserves and annual production from a filing
///
/// A `Success` always carries finite, non-negative barrel figures; the
/// constructors enforce this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionResult {
    /// Both figures were found
    Success {
        /// Proved reserves in barrels
        reserves_barrels: f64,
        /// Annual production in barrels per year
        production_barrels_per_year: f64,
        /// Units the figures were reported in
        units_found: String,
        /// Free-form notes from the model
        confidence_notes: String,
        /// Audit log
        log: Vec<String>,
    },

    /// No usable figures
    Failure {
        /// Failure category
        kind: FailureKind,
        /// Short reason
        reason: String,
        /// Audit log, ending with the reason
        log: Vec<String>,
    },
}

impl ExtractionResult {
    /// Build a successful result
    ///
    /// Negative or non-finite figures turn the result into a
    /// `MalformedResponse` failure instead.
    pub fn success(
        reserves_barrels: f64,
        production_barrels_per_year: f64,
        units_found: impl Into<String>,
        confidence_notes: impl Into<String>,
        log: ExtractionLog,
    ) -> Self {
        for (label, value) in [
            ("reserves", reserves_barrels),
            ("production", production_barrels_per_year),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Self::failure(
                    FailureKind::MalformedResponse,
                    format!("{} figure {} is not a non-negative number", label, value),
                    log,
                );
            }
        }

        ExtractionResult::Success {
            reserves_barrels,
            production_barrels_per_year,
            units_found: units_found.into(),
            confidence_notes: confidence_notes.into(),
            log: log.into_entries(),
        }
    }

    /// Build a failed result; the reason is appended to the log
    pub fn failure(kind: FailureKind, reason: impl Into<String>, mut log: ExtractionLog) -> Self {
        let reason = reason.into();
        log.note(format!("Extraction failed ({}): {}", kind, reason));
        ExtractionResult::Failure {
            kind,
            reason,
            log: log.into_entries(),
        }
    }

    /// Whether both figures were extracted
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }

    /// Failure kind, if this is a failure
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ExtractionResult::Success { .. } => None,
            ExtractionResult::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Proved reserves in barrels, if extracted
    pub fn reserves_barrels(&self) -> Option<f64> {
        match self {
            ExtractionResult::Success { reserves_barrels, .. } => Some(*reserves_barrels),
            ExtractionResult::Failure { .. } => None,
        }
    }

    /// Annual production in barrels per year, if extracted
    pub fn production_barrels_per_year(&self) -> Option<f64> {
        match self {
            ExtractionResult::Success {
                production_barrels_per_year,
                ..
            } => Some(*production_barrels_per_year),
            ExtractionResult::Failure { .. } => None,
        }
    }

    /// Audit log
    pub fn log(&self) -> &[String] {
        match self {
            ExtractionResult::Success { log, .. } => log,
            ExtractionResult::Failure { log, .. } => log,
        }
    }

    /// One-line summary for listings
    pub fn summary(&self) -> String {
        match self {
            ExtractionResult::Success {
                reserves_barrels,
                production_barrels_per_year,
                ..
            } => format!(
                "reserves {:.0} bbl, production {:.0} bbl/yr",
                reserves_barrels, production_barrels_per_year
            ),
            ExtractionResult::Failure { kind, reason, .. } => format!("{}: {}", kind, reason),
        }
    }
}
