//! Ledger row model
//!
//! One ledger line describes a segment of the distribution network: a link
//! between two named actors carrying a volume and a per-segment leak
//! percentage. Fields that the line does not carry (encoded as `-` or an
//! empty field, or an unparsable numeric) are represented as `None`, never
//! as 0.0 — downstream logic must be able to tell "absent" from
//! "legitimately zero".

use serde::{Deserialize, Serialize};

/// Category of a ledger row, resolved by a [`RowClassifier`](crate::classify::RowClassifier)
///
/// The category decides which index fields the row feeds and whether its
/// endpoints become distribution-graph nodes:
/// - Raw sources never become nodes
/// - End-users never become nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Raw source feeding an actor (volume is captured by the downstream)
    SourceToActor,
    /// Declaration of an actor's maximum capacity
    ActorDeclaration,
    /// Link between two distribution actors
    ActorToActor,
    /// Link from an actor to an end-user (terminal consumption)
    ActorToUser,
    /// Unclassifiable row, ignored by every consumer
    Unknown,
}

/// One parsed ledger row
///
/// Field layout follows the five semicolon-delimited columns of the input:
/// declared actor, upstream identifier, downstream identifier, volume,
/// leak percentage.
///
/// # Example
/// ```
/// use water_network_core_rs::LedgerRow;
///
/// let row = LedgerRow::parse("Facility A;Source 1;Plant Alpha;620.5;2");
/// assert_eq!(row.upstream_id(), Some("Source 1"));
/// assert_eq!(row.volume(), Some(620.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    /// Declared actor responsible for this segment (column 1)
    actor_id: Option<String>,

    /// Upstream endpoint of the segment (column 2)
    upstream_id: Option<String>,

    /// Downstream endpoint of the segment (column 3)
    downstream_id: Option<String>,

    /// Volume flowing through the segment (column 4)
    volume: Option<f64>,

    /// Per-segment leak percentage, nominally 0-100 (column 5)
    leak_percent: Option<f64>,
}

/// Absent-field sentinel used by the input format
const ABSENT: &str = "-";

fn parse_field(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == ABSENT {
        None
    } else {
        Some(raw.to_string())
    }
}

fn parse_numeric(raw: Option<&str>) -> Option<f64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == ABSENT {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            // The original coerced unparsable numerics to 0.0; making the
            // failure an explicit absence keeps sums uncorrupted.
            tracing::warn!(field = raw, "unparsable numeric field treated as absent");
            None
        }
    }
}

impl LedgerRow {
    /// Build a row directly from already-resolved fields (used by tests and
    /// programmatic ledger construction)
    pub fn new(
        actor_id: Option<String>,
        upstream_id: Option<String>,
        downstream_id: Option<String>,
        volume: Option<f64>,
        leak_percent: Option<f64>,
    ) -> Self {
        Self {
            actor_id,
            upstream_id,
            downstream_id,
            volume,
            leak_percent,
        }
    }

    /// Parse one semicolon-delimited data line into a row
    ///
    /// Lines shorter than five fields pad the tail with absences. A `-` or
    /// empty field is absent; an unparsable numeric is absent (logged).
    pub fn parse(line: &str) -> Self {
        let mut fields = line.trim_end_matches(['\r', '\n']).split(';');
        Self {
            actor_id: parse_field(fields.next()),
            upstream_id: parse_field(fields.next()),
            downstream_id: parse_field(fields.next()),
            volume: parse_numeric(fields.next()),
            leak_percent: parse_numeric(fields.next()),
        }
    }

    /// Declared actor identifier, if present
    pub fn actor_id(&self) -> Option<&str> {
        self.actor_id.as_deref()
    }

    /// Upstream endpoint identifier, if present
    pub fn upstream_id(&self) -> Option<&str> {
        self.upstream_id.as_deref()
    }

    /// Downstream endpoint identifier, if present
    pub fn downstream_id(&self) -> Option<&str> {
        self.downstream_id.as_deref()
    }

    /// Segment volume, if present and parsable
    pub fn volume(&self) -> Option<f64> {
        self.volume
    }

    /// Segment leak percentage, if present and parsable
    pub fn leak_percent(&self) -> Option<f64> {
        self.leak_percent
    }

    /// Leak percentage clamped to the valid 0-100 range, absent treated as 0
    ///
    /// Used wherever a leak value participates in arithmetic: a negative
    /// declaration cannot create water and a percentage above 100 cannot
    /// leak more than the segment carries.
    pub fn leak_percent_clamped(&self) -> f64 {
        self.leak_percent.unwrap_or(0.0).clamp(0.0, 100.0)
    }
}
