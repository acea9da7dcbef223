//! Extract command implementation.

use crate::cli::{ExtractAction, ExtractArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use reserve_life_extractor::{BatchOptions, Extractor};
use reserve_life_sec::EdgarClient;
use reserve_life_store::JsonStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Execute the extract command.
///
/// The LLM credential is checked before any filing is touched.
pub async fn execute_extract(
    args: ExtractArgs,
    store: &mut JsonStore,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let llm = config.llm.provider()?;
    let source = EdgarClient::new(config.sec.clone())?;
    let extractor = Extractor::new(source, llm, config.extractor.clone())?;

    match args.action {
        ExtractAction::One { ticker, accession } => {
            let result = extractor.extract_one(store, &ticker, &accession).await?;
            println!("{}", formatter.format_result(&result)?);
        }
        ExtractAction::All { force, ticker } => {
            let stop = Arc::new(AtomicBool::new(false));
            let watcher = tokio::spawn(watch_interrupt(Arc::clone(&stop)));

            let options = BatchOptions { force, ticker };
            let report = extractor.extract_all(store, &options, &stop).await;
            watcher.abort();

            println!("{}", formatter.format_batch_report(&report)?);
        }
    }
    Ok(())
}

/// First Ctrl-C stops the batch after the current filing; a second exits.
async fn watch_interrupt(stop: Arc<AtomicBool>) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("Interrupt received, finishing the current filing");
    eprintln!("Stopping after the current filing (press Ctrl-C again to quit now)");
    stop.store(true, Ordering::SeqCst);

    if tokio::signal::ctrl_c().await.is_ok() {
        std::process::exit(130);
    }
}
