//! Row classification strategies
//!
//! Two incompatible classification dialects exist in the wild for this
//! ledger format: one keys on descriptive keywords inside the upstream
//! field ("Source", "Plant", ...), the other on identifier prefixes
//! ("source_", "usine_", ...). Which dialect applies is a property of the
//! data set, not of the algorithms, so classification sits behind a single
//! trait and the keyword/prefix tables are configuration.
//!
//! # Example
//!
//! ```rust
//! use water_network_core_rs::{KeywordClassifier, LedgerRow, RowClassifier, RowKind};
//!
//! let classifier = KeywordClassifier::default();
//! let row = LedgerRow::parse("Facility A;Source 1;Plant Alpha;620.5;2");
//! assert_eq!(classifier.classify(&row), RowKind::SourceToActor);
//! ```

pub mod keyword;
pub mod prefix;

use crate::models::{LedgerRow, RowKind};

pub use keyword::KeywordClassifier;
pub use prefix::PrefixClassifier;

/// Resolves the category of one ledger row
///
/// Implementations must be pure: the same row always classifies the same
/// way within one run.
pub trait RowClassifier {
    /// Classify one row into its [`RowKind`]
    fn classify(&self, row: &LedgerRow) -> RowKind;
}

/// Shared fallback rule: a row with both distribution endpoints present
/// that matched no dialect-specific rule is an actor-to-actor link.
fn fallback_kind(row: &LedgerRow) -> RowKind {
    if row.upstream_id().is_some() && row.downstream_id().is_some() {
        RowKind::ActorToActor
    } else {
        RowKind::Unknown
    }
}
