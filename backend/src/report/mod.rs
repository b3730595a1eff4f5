//! Report exporter
//!
//! Formats and writes the three report families:
//! - Aggregate volume reports (one metric of the aggregation index)
//! - Leak reports (single actor or batch)
//! - The append-only leak history (one line per invocation, never
//!   truncated)
//!
//! Writers are generic over `io::Write` so tests can render into memory;
//! the file-opening convenience wrappers live in the pipeline.

use std::io::Write;

use thiserror::Error;

use crate::balance::BalanceOutcome;
use crate::index::{AggregationIndex, Metric};

/// Errors raised while writing a report
#[derive(Debug, Error)]
pub enum ReportError {
    /// The output cannot be created or written (fatal)
    #[error("cannot write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Identifier ordering of an aggregate report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Write an aggregate report: header, then `identifier;value` per actor
///
/// Values carry three decimal places; the unit in the header matches the
/// ledger's native unit (thousands of cubic meters per year).
pub fn write_aggregate_report<W: Write>(
    index: &AggregationIndex,
    metric: Metric,
    order: SortOrder,
    out: &mut W,
) -> Result<(), ReportError> {
    writeln!(out, "identifier;{} (k.m3.year-1)", metric.header_label())?;

    // Collect first: the traversal callback cannot propagate io::Error
    let mut lines = Vec::with_capacity(index.len());
    let collect = |id: &str, record: &crate::models::ActorRecord| {
        lines.push(format!("{id};{:.3}", metric.select(record)));
    };
    match order {
        SortOrder::Ascending => index.for_each_ascending(collect),
        SortOrder::Descending => index.for_each_descending(collect),
    }
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// Write a single-actor leak report
///
/// A miss still produces a well-defined `identifier;0` row; the distinct
/// "not found" signal travels through [`BalanceOutcome`], not the file.
pub fn write_leak_report_single<W: Write>(
    id: &str,
    outcome: BalanceOutcome,
    out: &mut W,
) -> Result<(), ReportError> {
    writeln!(out, "identifier;Leak volume (M.m3.year-1)")?;
    writeln!(out, "{id};{:.1}", outcome.leak())?;
    Ok(())
}

/// Write a batch leak report: one row per positive-leak actor
///
/// The unit scale the caller applied to the volumes is documented in the
/// header so the report is self-describing.
pub fn write_leak_report_batch<W: Write>(
    rows: &[(String, f64)],
    unit_divisor: f64,
    out: &mut W,
) -> Result<(), ReportError> {
    writeln!(out, "identifier;Leak volume (k.m3.year-1 / {unit_divisor})")?;
    for (id, leak) in rows {
        writeln!(out, "{id};{leak:.1}")?;
    }
    Ok(())
}

/// Divisor converting ledger units (k.m3) to history units (M.m3)
const HISTORY_UNIT_DIVISOR: f64 = 1000.0;

/// Append one line to the leak history
///
/// The history is append-only by contract: each invocation adds exactly
/// one `identifier;leak` line in millions of cubic meters and never
/// truncates prior runs.
pub fn append_leak_history<W: Write>(
    id: &str,
    leak: f64,
    out: &mut W,
) -> Result<(), ReportError> {
    writeln!(out, "{id};{:.6}", leak / HISTORY_UNIT_DIVISOR)?;
    Ok(())
}
