//! One processing pass: fetch -> extract -> format -> update.

use anyhow::{Context, Result};
use smsledger_core::{preview_update, update_ledger};
use smsledger_ingest::{Extractor, MessageSource, fetch_bank_messages};
use tracing::{info, warn};

use crate::config::Config;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Messages from the bank number
    pub fetched: usize,
    pub extracted: usize,
    /// Messages dropped because they could not be parsed
    pub skipped: usize,
    /// Rows written (or, on a dry run, rows that would be written)
    pub added: usize,
}

/// Run one pass against `source`. With `dry_run` the new rows are printed to
/// stdout and the ledger is not modified.
///
/// A failing source or bad message is logged and skipped; only ledger I/O
/// fails the pass.
pub fn process_all(config: &Config, source: &dyn MessageSource, dry_run: bool) -> Result<PassSummary> {
    let extractor = Extractor::new(config.patterns()?, config.bank_identifier.clone());
    let ledger = config.ledger_path();
    info!("Using file path: {}", ledger.display());

    let messages = fetch_bank_messages(source, &config.bank_number);
    let mut summary = PassSummary {
        fetched: messages.len(),
        ..PassSummary::default()
    };

    let mut records = Vec::with_capacity(messages.len());
    for (idx, msg) in messages.iter().enumerate() {
        match extractor.extract(msg) {
            Ok(rec) => records.push(rec),
            Err(e) => {
                summary.skipped += 1;
                warn!(
                    index = idx,
                    received = ?msg.received,
                    "Error extracting info: {e}"
                );
            }
        }
    }
    summary.extracted = records.len();

    if records.is_empty() {
        info!("No new transactions to process");
        return Ok(summary);
    }

    summary.added = if dry_run {
        let rows = preview_update(&ledger, &records)
            .with_context(|| format!("preview {}", ledger.display()))?;
        for row in &rows {
            println!("{row}");
        }
        info!("Dry run: {} new transactions would be added", rows.len());
        rows.len()
    } else {
        update_ledger(&ledger, &records).with_context(|| format!("update {}", ledger.display()))?
    };

    Ok(summary)
}
