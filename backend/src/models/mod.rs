//! Domain models for the water-network analyzer

pub mod actor;
pub mod ledger;

// Re-exports
pub use actor::ActorRecord;
pub use ledger::{LedgerRow, RowKind};
