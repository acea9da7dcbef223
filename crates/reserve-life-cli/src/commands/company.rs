//! Company command implementation.

use crate::cli::{CompanyAction, CompanyArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use reserve_life_domain::traits::CompanyStore;
use reserve_life_domain::{Company, Ticker};
use reserve_life_sec::EdgarClient;
use reserve_life_store::JsonStore;
use tracing::warn;

/// Execute the company command.
pub async fn execute_company(
    args: CompanyArgs,
    store: &mut JsonStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        CompanyAction::Add {
            ticker,
            name,
            no_lookup,
        } => add_company(ticker, name, no_lookup, store, config, formatter).await,
        CompanyAction::Remove { ticker } => {
            let removed = store.remove_company(&ticker)?;
            println!(
                "{}",
                formatter.success(&format!(
                    "Removed {} and {} filing(s)",
                    removed.ticker,
                    removed.filings.len()
                ))
            );
            Ok(())
        }
        CompanyAction::List => {
            println!("{}", formatter.format_companies(&store.list_companies())?);
            Ok(())
        }
    }
}

async fn add_company(
    ticker: Ticker,
    name: Option<String>,
    no_lookup: bool,
    store: &mut JsonStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    if store.get_company(&ticker).is_some() {
        return Err(CliError::InvalidInput(format!("{} is already tracked", ticker)));
    }

    let mut company = Company::new(ticker.clone(), name.clone());

    if !no_lookup {
        let client = EdgarClient::new(config.sec.clone())?;
        match client.market_info(&ticker).await {
            Ok(info) => {
                if name.is_none() {
                    if let Some(market_name) = info.name.filter(|n| !n.trim().is_empty()) {
                        company.name = market_name;
                    }
                }
                company.price = info.price;
                company.currency = info.currency;
            }
            Err(e) => {
                warn!("Market data lookup for {} failed: {}", ticker, e);
                println!(
                    "{}",
                    formatter.warning("Market data unavailable; adding with the ticker only")
                );
            }
        }
    }

    let message = format!("Tracking {} ({})", company.ticker, company.name);
    store.add_company(company)?;
    println!("{}", formatter.success(&message));
    Ok(())
}
