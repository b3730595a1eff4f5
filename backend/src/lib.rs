//! Water Network Core - Rust Engine
//!
//! Batch analyzer for water-distribution ledgers: per-actor aggregate
//! volumes and leak estimation, either as a direct balance or by
//! propagating a volume through the distribution graph.
//!
//! # Architecture
//!
//! - **models**: Domain types (ActorRecord, LedgerRow)
//! - **classify**: Pluggable row-classification dialects
//! - **index**: AVL aggregation index (the ordered per-actor map)
//! - **aggregate** / **balance**: Streaming fill passes over the index
//! - **graph**: Two-pass distribution-graph builder and leak propagation
//! - **ingest** / **report**: Ledger reading and report export
//! - **pipeline**: End-to-end runs wiring the above together
//!
//! # Critical Invariants
//!
//! 1. Every invocation builds, uses, and discards its own index and graph
//! 2. Absent ledger fields are `None`, never silently 0.0
//! 3. The AVL balance factor stays in {-1, 0, +1} after every insertion
//! 4. Propagation conserves volume: leaked + delivered == seed

// Module declarations
pub mod aggregate;
pub mod balance;
pub mod classify;
pub mod graph;
pub mod index;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod report;

// Re-exports for convenience
pub use aggregate::build_aggregate_index;
pub use balance::{batch_balance, build_balance_index, query_balance, BalanceOutcome};
pub use classify::{KeywordClassifier, PrefixClassifier, RowClassifier};
pub use graph::{
    ChildEdge, DistributionGraph, DistributionNode, GraphError, PropagationError,
    PropagationOutcome,
};
pub use index::{AggregationIndex, Metric};
pub use ingest::{read_rows, IngestError};
pub use models::{ActorRecord, LedgerRow, RowKind};
pub use pipeline::{
    run_aggregate, run_leak_balance, run_leak_propagation, LeakRunSummary, LeakTarget,
    PipelineError,
};
pub use report::{ReportError, SortOrder};
