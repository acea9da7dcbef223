//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use reserve_life_domain::{Company, ExtractionResult, Filing, ReserveLifeDataPoint};
use reserve_life_extractor::{BatchReport, OutcomeStatus};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format tracked companies.
    pub fn format_companies(&self, companies: &[&Company]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(companies)?);
        }
        if companies.is_empty() {
            return Ok(self.colorize("No companies tracked.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["Ticker", "Name", "CIK", "Price", "Filings", "Extracted"]);

        for company in companies {
            let price = match (company.price, &company.currency) {
                (Some(price), Some(currency)) => format!("{:.2} {}", price, currency),
                (Some(price), None) => format!("{:.2}", price),
                _ => "-".to_string(),
            };
            let extracted = company
                .filings
                .iter()
                .filter(|f| f.extraction.as_ref().is_some_and(ExtractionResult::is_success))
                .count();
            builder.push_record([
                company.ticker.to_string(),
                company.name.clone(),
                company.cik.clone().unwrap_or_else(|| "-".to_string()),
                price,
                company.filings.len().to_string(),
                extracted.to_string(),
            ]);
        }

        Ok(self.table(builder))
    }

    /// Format a company's filings.
    pub fn format_filings(&self, company: &Company) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(&company.filings)?);
        }
        if company.filings.is_empty() {
            return Ok(self.colorize(
                &format!("No filings for {}. Run 'filings update' first.", company.ticker),
                "yellow",
            ));
        }

        let mut builder = Builder::default();
        builder.push_record(["Accession", "Form", "Period End", "Filed", "Extraction"]);

        for filing in &company.filings {
            builder.push_record([
                filing.accession.clone(),
                filing.form.to_string(),
                filing.period_end.to_string(),
                filing
                    .filing_date
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                self.extraction_status(filing),
            ]);
        }

        Ok(self.table(builder))
    }

    /// Format reserve life data points.
    pub fn format_series(&self, points: &[ReserveLifeDataPoint]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(points)?);
        }
        if points.is_empty() {
            return Ok(self.colorize("No reserve life data yet.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record([
            "Ticker",
            "Period End",
            "Form",
            "Reserves (bbl)",
            "Production (bbl/yr)",
            "Reserve Life (yrs)",
        ]);

        for point in points {
            builder.push_record([
                point.ticker.to_string(),
                point.period_end.to_string(),
                point.form.to_string(),
                group_thousands(point.reserves_barrels),
                group_thousands(point.production_barrels_per_year),
                format!("{:.1}", point.years),
            ]);
        }

        Ok(self.table(builder))
    }

    /// Format a filing's extraction result and log.
    pub fn format_log(&self, filing: &Filing) -> Result<String> {
        let Some(result) = &filing.extraction else {
            return Ok(self.warning(&format!("{} has not been extracted yet", filing.accession)));
        };
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(result)?);
        }

        let mut lines = vec![format!(
            "{} {} (period ending {})",
            filing.form, filing.accession, filing.period_end
        )];
        lines.push(self.result_line(result));
        if let ExtractionResult::Success {
            units_found,
            confidence_notes,
            ..
        } = result
        {
            lines.push(format!("Units: {}", units_found));
            if !confidence_notes.is_empty() {
                lines.push(format!("Notes: {}", confidence_notes));
            }
        }
        lines.push(String::new());
        lines.extend(
            result
                .log()
                .iter()
                .enumerate()
                .map(|(i, entry)| format!("{:>3}. {}", i + 1, entry)),
        );
        Ok(lines.join("\n"))
    }

    /// Format a batch extraction report.
    pub fn format_batch_report(&self, report: &BatchReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(report)?);
        }

        let mut lines: Vec<String> = report
            .outcomes
            .iter()
            .filter(|o| o.status != OutcomeStatus::Skipped)
            .map(|o| {
                let status = match &o.status {
                    OutcomeStatus::Extracted => self.colorize("extracted", "green"),
                    OutcomeStatus::Failed(kind) => self.colorize(kind.as_str(), "yellow"),
                    OutcomeStatus::StoreError(e) => self.colorize(&format!("not saved: {}", e), "red"),
                    OutcomeStatus::Skipped => String::new(),
                };
                format!("  {} {}: {}", o.ticker, o.accession, status)
            })
            .collect();

        let summary = format!(
            "{} extracted, {} no data, {} malformed, {} unavailable, {} skipped",
            report.extracted, report.no_data, report.malformed, report.unavailable, report.skipped
        );
        lines.push(if report.store_errors > 0 {
            self.error(&format!("{}, {} not saved", summary, report.store_errors))
        } else {
            self.success(&summary)
        });
        if report.stopped {
            lines.push(self.warning("Stopped before all filings were processed"));
        }
        Ok(lines.join("\n"))
    }

    /// Format a single extraction result.
    pub fn format_result(&self, result: &ExtractionResult) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(result)?);
        }
        Ok(self.result_line(result))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn result_line(&self, result: &ExtractionResult) -> String {
        match result {
            ExtractionResult::Success {
                reserves_barrels,
                production_barrels_per_year,
                ..
            } => self.success(&format!(
                "Reserves {} bbl, production {} bbl/yr",
                group_thousands(*reserves_barrels),
                group_thousands(*production_barrels_per_year)
            )),
            ExtractionResult::Failure { .. } => self.error(&result.summary()),
        }
    }

    fn extraction_status(&self, filing: &Filing) -> String {
        match &filing.extraction {
            None => "-".to_string(),
            Some(result) if result.is_success() => self.colorize(&result.summary(), "green"),
            Some(result) => self.colorize(&result.summary(), "yellow"),
        }
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Round to a whole number and group digits: 1234567.8 -> "1,234,568"
pub fn group_thousands(value: f64) -> String {
    let digits = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0.0 && grouped.chars().any(|c| c != '0' && c != ',') {
        grouped.insert(0, '-');
    }
    grouped
}
