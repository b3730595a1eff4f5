//! Ledger ingestion
//!
//! Reads the semicolon-delimited ledger file: one header line (skipped),
//! then one [`LedgerRow`] per data line. Blank lines are skipped. The file
//! handle is scoped to one read-to-EOF; tokenization details live in
//! [`LedgerRow::parse`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::LedgerRow;

/// Errors raised while reading the ledger
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input file cannot be opened or read (fatal)
    #[error("cannot read ledger '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read every data row from a ledger file
///
/// The first line is the header and is always skipped.
pub fn read_rows(path: &Path) -> Result<Vec<LedgerRow>, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut rows = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line_no == 0 || line.trim().is_empty() {
            continue;
        }
        rows.push(LedgerRow::parse(&line));
    }

    tracing::info!(path = %path.display(), rows = rows.len(), "ledger read");
    Ok(rows)
}
