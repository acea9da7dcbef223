//! Filings command implementation.

use crate::cli::{FilingsAction, FilingsArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::{Duration, Local, NaiveDate};
use reserve_life_domain::traits::CompanyStore;
use reserve_life_domain::{FilingType, Ticker};
use reserve_life_sec::EdgarClient;
use reserve_life_store::JsonStore;
use std::collections::HashSet;
use tracing::{info, warn};

/// Default look-back when no start date is given
const DEFAULT_YEARS_BACK: i64 = 5;

/// Longest date range a single update may cover
const MAX_RANGE_YEARS: i64 = 10;

/// Execute the filings command.
pub async fn execute_filings(
    args: FilingsArgs,
    store: &mut JsonStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        FilingsAction::Update {
            ticker,
            from,
            to,
            forms,
        } => {
            let (start, end) = date_window(from, to, Local::now().date_naive())?;
            let forms: Vec<FilingType> = forms.iter().map(|f| FilingType::parse(f)).collect();
            update_filings(ticker, start, end, &forms, store, config, formatter).await
        }
        FilingsAction::List { ticker } => {
            let company = store
                .get_company(&ticker)
                .ok_or_else(|| CliError::NotFound(ticker.to_string()))?;
            println!("{}", formatter.format_filings(company)?);
            Ok(())
        }
    }
}

/// Resolve the update window; defaults to the last five years.
pub fn date_window(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let end = to.unwrap_or(today);
    let start = from.unwrap_or(end - Duration::days(365 * DEFAULT_YEARS_BACK));

    if start > end {
        return Err(CliError::InvalidInput(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }
    if (end - start).num_days() > 365 * MAX_RANGE_YEARS {
        return Err(CliError::InvalidInput(format!(
            "date range may cover at most {} years",
            MAX_RANGE_YEARS
        )));
    }
    Ok((start, end))
}

async fn update_filings(
    ticker: Option<Ticker>,
    start: NaiveDate,
    end: NaiveDate,
    forms: &[FilingType],
    store: &mut JsonStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let tickers: Vec<Ticker> = match ticker {
        Some(ticker) => {
            if store.get_company(&ticker).is_none() {
                return Err(CliError::NotFound(ticker.to_string()));
            }
            vec![ticker]
        }
        None => store.list_companies().iter().map(|c| c.ticker.clone()).collect(),
    };
    if tickers.is_empty() {
        println!("{}", formatter.info("No companies tracked. Use 'company add' first."));
        return Ok(());
    }

    let client = EdgarClient::new(config.sec.clone())?;
    info!("Updating filings for {} companies, {} to {}", tickers.len(), start, end);

    let mut failures = 0;
    for ticker in &tickers {
        match update_company(&client, ticker, start, end, forms, store).await {
            Ok(added) => println!(
                "{}",
                formatter.success(&format!("{}: {} new filing(s)", ticker, added))
            ),
            Err(e) => {
                warn!("Filing update for {} failed: {}", ticker, e);
                println!("{}", formatter.error(&format!("{}: {}", ticker, e)));
                failures += 1;
            }
        }
    }

    if failures > 0 {
        println!(
            "{}",
            formatter.warning(&format!("{} of {} companies could not be updated", failures, tickers.len()))
        );
    }
    Ok(())
}

async fn update_company(
    client: &EdgarClient,
    ticker: &Ticker,
    start: NaiveDate,
    end: NaiveDate,
    forms: &[FilingType],
    store: &mut JsonStore,
) -> Result<usize> {
    let company = store
        .get_company(ticker)
        .ok_or_else(|| CliError::NotFound(ticker.to_string()))?;
    let known: HashSet<String> = company.filings.iter().map(|f| f.accession.clone()).collect();

    let cik = match company.cik.clone() {
        Some(cik) => cik,
        None => {
            let cik = client.cik_for_ticker(ticker).await?;
            store.set_cik(ticker, &cik)?;
            cik
        }
    };

    let filings = client.discover_filings(&cik, forms, start, end, &known).await?;
    Ok(store.merge_filings(ticker, filings)?)
}
