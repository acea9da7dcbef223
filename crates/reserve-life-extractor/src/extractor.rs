//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::{parse_llm_response, ParsedResponse, RawFigures};
use crate::prompt::PromptBuilder;
use crate::reducer::ContentReducer;
use crate::types::{BatchOptions, BatchReport};
use reserve_life_domain::traits::{CompanyStore, FilingSource, LlmProvider, Transient};
use reserve_life_domain::{
    units, ExtractionLog, ExtractionResult, FailureKind, Filing, FilingType, Ticker,
};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// The Extractor turns a filing into reserves and production figures
///
/// Stages: fetch, reduce, prompt, LLM, parse, normalize. Every stage writes
/// to the result's audit log, and no stage can make [`Extractor::extract`]
/// return an error.
pub struct Extractor<F, L>
where
    F: FilingSource,
    L: LlmProvider,
{
    source: F,
    llm: L,
    reducer: ContentReducer,
    config: ExtractorConfig,
}

impl<F, L> Extractor<F, L>
where
    F: FilingSource,
    L: LlmProvider,
{
    /// Create a new Extractor
    pub fn new(source: F, llm: L, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            source,
            llm,
            reducer: ContentReducer::from_config(&config),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract figures from one filing
    pub async fn extract(&self, filing: &Filing) -> ExtractionResult {
        self.run(None, filing).await
    }

    /// Extract one stored filing and persist the result
    pub async fn extract_one<S: CompanyStore>(
        &self,
        store: &mut S,
        ticker: &Ticker,
        accession: &str,
    ) -> Result<ExtractionResult, ExtractorError> {
        let company = store
            .get_company(ticker)
            .ok_or_else(|| ExtractorError::CompanyNotFound(ticker.to_string()))?;
        let filing = company
            .filing(accession)
            .cloned()
            .ok_or_else(|| ExtractorError::FilingNotFound {
                ticker: ticker.to_string(),
                accession: accession.to_string(),
            })?;
        let name = company.name.clone();

        let result = self.run(Some(&name), &filing).await;
        info!("{} {}: {}", ticker, accession, result.summary());

        store
            .attach_extraction(ticker, accession, result.clone())
            .map_err(|e| ExtractorError::Store(e.to_string()))?;
        Ok(result)
    }

    /// Extract every pending filing in the store, one at a time
    ///
    /// Each result is persisted as soon as it is produced. `stop` is checked
    /// before each filing.
    pub async fn extract_all<S: CompanyStore>(
        &self,
        store: &mut S,
        options: &BatchOptions,
        stop: &AtomicBool,
    ) -> BatchReport {
        let work: Vec<(Ticker, String, Vec<Filing>)> = store
            .list_companies()
            .into_iter()
            .filter(|c| options.ticker.as_ref().is_none_or(|t| *t == c.ticker))
            .map(|c| (c.ticker.clone(), c.name.clone(), c.filings.clone()))
            .collect();

        let total: usize = work.iter().map(|(_, _, filings)| filings.len()).sum();
        info!(
            "Starting batch extraction over {} companies, {} filings (force: {})",
            work.len(),
            total,
            options.force
        );

        let mut report = BatchReport::default();

        'companies: for (ticker, name, filings) in work {
            for filing in filings {
                if stop.load(Ordering::SeqCst) {
                    warn!("Stop requested, ending batch before {} {}", ticker, filing.accession);
                    report.stopped = true;
                    break 'companies;
                }

                if !options.force && !needs_extraction(&filing) {
                    debug!("Skipping {} {}: already final", ticker, filing.accession);
                    report.record_skip(&ticker, &filing.accession);
                    continue;
                }

                let result = self.run(Some(&name), &filing).await;
                info!("{} {}: {}", ticker, filing.accession, result.summary());

                match store.attach_extraction(&ticker, &filing.accession, result.clone()) {
                    Ok(_) => report.record_result(&ticker, &filing.accession, &result),
                    Err(e) => {
                        error!("Failed to store result for {} {}: {}", ticker, filing.accession, e);
                        report.record_store_error(&ticker, &filing.accession, e.to_string());
                    }
                }
            }
        }

        info!(
            "Batch extraction complete: {} extracted, {} no data, {} malformed, {} unavailable, {} skipped",
            report.extracted, report.no_data, report.malformed, report.unavailable, report.skipped
        );
        report
    }

    async fn run(&self, company: Option<&str>, filing: &Filing) -> ExtractionResult {
        let mut log = ExtractionLog::new();

        log.note(format!(
            "Fetching {} {} ({})",
            filing.form, filing.accession, filing.url
        ));
        let document = match self.source.fetch_document(&filing.url).await {
            Ok(document) => document,
            Err(e) => {
                let kind = if e.is_transient() {
                    FailureKind::UpstreamUnavailable
                } else {
                    FailureKind::NoData
                };
                warn!("Fetch failed for {}: {}", filing.accession, e);
                return ExtractionResult::failure(kind, format!("filing fetch failed: {}", e), log);
            }
        };
        log.note(format!("Fetched document ({} chars)", document.len()));

        let excerpt = self.reducer.reduce(&document);
        if excerpt.is_empty() {
            log.note("No relevant content in document; LLM not called");
            return ExtractionResult::failure(FailureKind::NoData, "no relevant content", log);
        }
        log.note(format!(
            "Reduced to {} tables and {} paragraphs ({} chars, {} blocks dropped{})",
            excerpt.tables,
            excerpt.paragraphs,
            excerpt.char_count(),
            excerpt.dropped,
            if excerpt.truncated { ", truncated" } else { "" }
        ));

        let mut builder = PromptBuilder::new(excerpt.text).with_filing(filing);
        if let Some(company) = company {
            builder = builder.with_company(company);
        }
        let prompt = builder.build();
        debug!("Prompt length: {} chars", prompt.len());

        log.note(format!("Querying {}", self.llm.model_name()));
        let options = self.config.generation_options();
        let response = match timeout(
            self.config.extraction_timeout(),
            self.llm.generate(&prompt, &options),
        )
        .await
        {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let kind = if e.is_transient() {
                    FailureKind::UpstreamUnavailable
                } else {
                    FailureKind::MalformedResponse
                };
                warn!("LLM call failed for {}: {}", filing.accession, e);
                return ExtractionResult::failure(kind, format!("LLM call failed: {}", e), log);
            }
            Err(_) => {
                warn!("LLM call timed out for {}", filing.accession);
                return ExtractionResult::failure(
                    FailureKind::UpstreamUnavailable,
                    format!(
                        "LLM call timed out after {}s",
                        self.config.extraction_timeout_secs
                    ),
                    log,
                );
            }
        };
        log.note(format!("Received response ({} chars)", response.len()));

        match parse_llm_response(&response, &mut log) {
            ParsedResponse::Figures(figures) => normalize(figures, &filing.form, log),
            ParsedResponse::NoData(reason) => {
                ExtractionResult::failure(FailureKind::NoData, reason, log)
            }
            ParsedResponse::Malformed(reason) => {
                ExtractionResult::failure(FailureKind::MalformedResponse, reason, log)
            }
        }
    }
}

/// Whether a filing still needs a (non-forced) extraction run
///
/// True when it has no result or only a retryable failure.
pub fn needs_extraction(filing: &Filing) -> bool {
    match &filing.extraction {
        None => true,
        Some(result) => result.failure_kind().is_some_and(|kind| kind.is_retryable()),
    }
}

/// Quarterly reports that give a volume rather than a rate cover one quarter
const QUARTERS_PER_YEAR: f64 = 4.0;

fn normalize(figures: RawFigures, form: &FilingType, mut log: ExtractionLog) -> ExtractionResult {
    let (reserves_unit, production_unit) = units::split_units(&figures.units_found);
    let reserves = units::normalize(figures.reserves, &reserves_unit);
    let mut production = units::normalize_rate(figures.production, &production_unit);

    if let Some(note) = &reserves.note {
        log.note(format!("Reserves unit '{}': {}", reserves_unit, note));
    }
    if let Some(note) = &production.note {
        log.note(format!("Production unit '{}': {}", production_unit, note));
    }
    if *form == FilingType::Quarterly
        && !production.annualized
        && !units::is_annual(&production_unit)
    {
        production.barrels = (production.barrels * QUARTERS_PER_YEAR).min(f64::MAX);
        log.note(format!(
            "Quarterly production volume annualized ×{}",
            QUARTERS_PER_YEAR
        ));
    }
    log.note(format!(
        "Normalized reserves {} bbl, production {} bbl/year",
        reserves.barrels, production.barrels
    ));

    ExtractionResult::success(
        reserves.barrels,
        production.barrels,
        figures.units_found,
        figures.confidence_notes,
        log,
    )
}
