//! Direct balance calculator
//!
//! Estimates per-actor leaks from the aggregation index alone: everything
//! that enters an actor (source rows) accumulates as captured volume,
//! everything that leaves it (links to other actors or to end-users)
//! accumulates as treated volume, and the leak is the absolute difference.
//!
//! A treated volume exceeding the captured volume is physically impossible
//! but can appear with odd data orderings; the absolute value is kept for
//! compatibility and the sign flip is logged.

use serde::{Deserialize, Serialize};

use crate::classify::RowClassifier;
use crate::index::AggregationIndex;
use crate::models::{LedgerRow, RowKind};

/// Result of a single-actor balance query
///
/// `NotFound` is a normal outcome, distinct from a computed zero leak: the
/// report still gets a zero-valued row, but the caller is told it was a
/// miss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BalanceOutcome {
    /// The actor exists; leak is `|captured - treated|`
    Found { leak: f64 },
    /// The actor is unknown to the index
    NotFound,
}

impl BalanceOutcome {
    /// Leak volume to report (0 for a miss)
    pub fn leak(&self) -> f64 {
        match self {
            BalanceOutcome::Found { leak } => *leak,
            BalanceOutcome::NotFound => 0.0,
        }
    }

    /// True when the queried actor was absent from the ledger
    pub fn is_miss(&self) -> bool {
        matches!(self, BalanceOutcome::NotFound)
    }
}

/// Build the balance index from classified rows
///
/// Source rows credit the downstream actor's captured volume; actor links
/// and user links credit the upstream actor's treated volume.
pub fn build_balance_index(
    rows: &[LedgerRow],
    classifier: &dyn RowClassifier,
) -> AggregationIndex {
    let mut index = AggregationIndex::new();

    for row in rows {
        match classifier.classify(row) {
            RowKind::SourceToActor => {
                let (Some(id), Some(volume)) = (row.downstream_id(), row.volume()) else {
                    tracing::warn!("source row missing downstream or volume, skipped");
                    continue;
                };
                index.insert(id);
                index.add_captured(id, volume);
            }
            RowKind::ActorToActor | RowKind::ActorToUser => {
                let (Some(id), Some(volume)) = (row.upstream_id(), row.volume()) else {
                    tracing::warn!("link row missing upstream or volume, skipped");
                    continue;
                };
                index.insert(id);
                index.add_treated(id, volume);
            }
            RowKind::ActorDeclaration | RowKind::Unknown => {}
        }
    }

    index
}

/// Query one actor's balance leak
pub fn query_balance(index: &AggregationIndex, id: &str) -> BalanceOutcome {
    match index.get(id) {
        None => BalanceOutcome::NotFound,
        Some(record) => {
            let raw = record.captured_volume() - record.treated_volume();
            if raw < 0.0 {
                tracing::warn!(
                    id,
                    raw,
                    "treated volume exceeds captured volume, reporting absolute value"
                );
            }
            BalanceOutcome::Found { leak: raw.abs() }
        }
    }
}

/// Batch balance: one `(identifier, leak)` row per actor with strictly
/// positive leak and at least one nonzero volume, ascending identifier
/// order, values divided by `unit_divisor`.
pub fn batch_balance(index: &AggregationIndex, unit_divisor: f64) -> Vec<(String, f64)> {
    let mut out = Vec::new();
    index.for_each_ascending(|id, record| {
        let leak = (record.captured_volume() - record.treated_volume()).abs();
        let has_volume = record.captured_volume() != 0.0 || record.treated_volume() != 0.0;
        if leak > 0.0 && has_volume {
            out.push((id.to_string(), leak / unit_divisor));
        }
    });
    out
}
