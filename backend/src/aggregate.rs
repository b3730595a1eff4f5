//! Aggregate volume accumulation
//!
//! One streaming pass over classified rows filling the
//! [`AggregationIndex`] with per-actor volumes:
//! - Source rows credit the downstream actor with captured volume and with
//!   treated volume after the segment's own loss
//! - Declaration rows overwrite the actor's maximum capacity
//!
//! A row with an absent-but-required field is skipped with a warning; it is
//! never treated as a zero-valued row.

use crate::classify::RowClassifier;
use crate::index::AggregationIndex;
use crate::models::{LedgerRow, RowKind};

/// Identifier a declaration row declares: the upstream field in the keyword
/// dialect, the declared-actor field in the prefix dialect.
fn declaration_id(row: &LedgerRow) -> Option<&str> {
    row.upstream_id().or_else(|| row.actor_id())
}

/// Build the aggregate index from classified rows
///
/// # Example
/// ```
/// use water_network_core_rs::{build_aggregate_index, KeywordClassifier, LedgerRow};
///
/// let rows = vec![LedgerRow::parse("Facility A;Source 1;Plant Alpha;100;10")];
/// let index = build_aggregate_index(&rows, &KeywordClassifier::default());
/// let record = index.get("Plant Alpha").unwrap();
/// assert_eq!(record.captured_volume(), 100.0);
/// assert_eq!(record.treated_volume(), 90.0);
/// ```
pub fn build_aggregate_index(
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
                let leak = row.leak_percent_clamped();
                index.add_treated(id, volume * (1.0 - leak / 100.0));
            }
            RowKind::ActorDeclaration => {
                let (Some(id), Some(capacity)) = (declaration_id(row), row.volume()) else {
                    tracing::warn!("declaration row missing identifier or volume, skipped");
                    continue;
                };
                index.insert(id);
                index.set_max_capacity(id, capacity);
            }
            RowKind::ActorToActor | RowKind::ActorToUser | RowKind::Unknown => {}
        }
    }

    index
}
