//! Ledger file updates: append new table rows after the last table line.
//!
//! The file is read whole, new rows are spliced in after the last non-blank
//! line containing `|`, and the result is written back through a temp file in
//! the same directory. Nothing is written when every row is already present.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::record::TransactionRecord;
use crate::row::format_row;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write ledger {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of splicing rows into ledger text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerUpdate {
    pub content: String,
    /// Rows that were inserted, in input order.
    pub added: Vec<String>,
}

fn is_table_line(line: &str) -> bool {
    !line.trim().is_empty() && line.contains('|')
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

/// Index right after the last table line, or 0 when the file has none.
pub fn insertion_point<S: AsRef<str>>(lines: &[S]) -> usize {
    lines
        .iter()
        .rposition(|l| is_table_line(l.as_ref()))
        .map_or(0, |i| i + 1)
}

/// Splice `rows` into `content`, skipping rows already present verbatim.
///
/// Returns `None` when no row is new. Rows are compared as whole lines with the
/// line terminator ignored; duplicates within `rows` itself are not collapsed.
pub fn splice_rows(content: &str, rows: &[String]) -> Option<LedgerUpdate> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let existing: HashSet<&str> = lines.iter().map(|l| strip_eol(l)).collect();

    let added: Vec<String> = rows
        .iter()
        .filter(|row| !existing.contains(row.as_str()))
        .cloned()
        .collect();

    if added.is_empty() {
        return None;
    }

    let eol = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let at = insertion_point(&lines);
    debug!(insertion_point = at, lines = lines.len(), "splicing ledger rows");

    let mut out = String::with_capacity(content.len() + added.iter().map(|r| r.len() + 2).sum::<usize>());
    for line in &lines[..at] {
        out.push_str(line);
    }
    // Last table line may be the final line of a file without a trailing newline.
    if at > 0 && !lines[at - 1].ends_with('\n') {
        out.push_str(eol);
    }
    for row in &added {
        out.push_str(row);
        out.push_str(eol);
    }
    for line in &lines[at..] {
        out.push_str(line);
    }

    Some(LedgerUpdate { content: out, added })
}

fn read_ledger(path: &Path) -> Result<String, LedgerError> {
    fs::read_to_string(path).map_err(|source| LedgerError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Rows that an update with `records` would add, without touching the file.
pub fn preview_update(path: &Path, records: &[TransactionRecord]) -> Result<Vec<String>, LedgerError> {
    let content = read_ledger(path)?;
    let rows: Vec<String> = records.iter().map(format_row).collect();
    Ok(splice_rows(&content, &rows).map(|u| u.added).unwrap_or_default())
}

/// Append `records` to the ledger at `path`, returning how many rows were added.
///
/// The file is left untouched when nothing is new.
pub fn update_ledger(path: &Path, records: &[TransactionRecord]) -> Result<usize, LedgerError> {
    info!("Opening file: {}", path.display());
    // Write through symlinks: the rename must land on the real file.
    let resolved = fs::canonicalize(path).map_err(|source| LedgerError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let path = resolved.as_path();
    let content = read_ledger(path)?;
    let rows: Vec<String> = records.iter().map(format_row).collect();

    let Some(update) = splice_rows(&content, &rows) else {
        info!("No new transactions to add");
        return Ok(0);
    };

    write_replace(path, &update.content).map_err(|source| LedgerError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Added {} new transactions", update.added.len());
    Ok(update.added.len())
}

/// Write via a sibling temp file and rename over `path`, keeping its permissions.
fn write_replace(path: &Path, content: &str) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
