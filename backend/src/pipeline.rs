//! Pipeline - end-to-end runs
//!
//! Wires ingestion, classification, indexing, graph construction,
//! propagation and report export into the three invocations the CLI
//! exposes. Each run reads the full input, builds its own index and graph,
//! writes its output and discards everything; nothing is shared between
//! runs.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::aggregate::build_aggregate_index;
use crate::balance::{batch_balance, build_balance_index, query_balance, BalanceOutcome};
use crate::classify::RowClassifier;
use crate::graph::{DistributionGraph, GraphError, PropagationError};
use crate::index::Metric;
use crate::ingest::{read_rows, IngestError};
use crate::report::{
    append_leak_history, write_aggregate_report, write_leak_report_batch,
    write_leak_report_single, ReportError, SortOrder,
};

/// Umbrella error for a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Output file cannot be created or written
    #[error("cannot write output '{path}': {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Propagation(#[from] PropagationError),
}

/// Target of a leak run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeakTarget {
    /// One actor by identifier
    Single(String),
    /// Every positive-leak actor
    All,
}

/// What a leak run found, reported alongside the written file
#[derive(Debug, Clone, PartialEq)]
pub struct LeakRunSummary {
    /// Total leak volume written to the report
    pub leak: f64,

    /// True when a single-target query missed (the report row is 0 and the
    /// caller should surface the distinct not-found signal)
    pub target_missing: bool,
}

fn create_output(path: &Path) -> Result<BufWriter<File>, PipelineError> {
    let file = File::create(path).map_err(|source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufWriter::new(file))
}

fn flush_output(mut out: BufWriter<File>, path: &Path) -> Result<(), PipelineError> {
    out.flush().map_err(|source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    })
}

/// Run an aggregate-report invocation
///
/// The `max` metric reports in descending identifier order, `source` and
/// `real` in ascending order.
pub fn run_aggregate(
    input: &Path,
    metric: Metric,
    output: &Path,
    classifier: &dyn RowClassifier,
) -> Result<(), PipelineError> {
    let rows = read_rows(input)?;
    let index = build_aggregate_index(&rows, classifier);

    let order = match metric {
        Metric::MaxCapacity => SortOrder::Descending,
        Metric::Captured | Metric::Treated => SortOrder::Ascending,
    };

    let mut out = create_output(output)?;
    write_aggregate_report(&index, metric, order, &mut out)?;
    flush_output(out, output)?;

    tracing::info!(output = %output.display(), actors = index.len(), "aggregate report written");
    Ok(())
}

/// Run a direct-balance leak invocation
pub fn run_leak_balance(
    input: &Path,
    target: &LeakTarget,
    output: &Path,
    unit_divisor: f64,
    classifier: &dyn RowClassifier,
) -> Result<LeakRunSummary, PipelineError> {
    let rows = read_rows(input)?;
    let index = build_balance_index(&rows, classifier);

    let mut out = create_output(output)?;
    let summary = match target {
        LeakTarget::Single(id) => {
            let outcome = query_balance(&index, id);
            write_leak_report_single(id, outcome, &mut out)?;
            LeakRunSummary {
                leak: outcome.leak(),
                target_missing: outcome.is_miss(),
            }
        }
        LeakTarget::All => {
            let batch = batch_balance(&index, unit_divisor);
            let leak = batch.iter().map(|(_, v)| v).sum();
            write_leak_report_batch(&batch, unit_divisor, &mut out)?;
            LeakRunSummary {
                leak,
                target_missing: false,
            }
        }
    };
    flush_output(out, output)?;
    Ok(summary)
}

/// Run a graph-propagation leak invocation
///
/// Seeds the propagation with the target actor's treated volume from the
/// aggregate index (treated, not captured: treated volume already reflects
/// losses between the actor's own sources and the actor itself). When a
/// history path is given, appends exactly one line to it.
pub fn run_leak_propagation(
    input: &Path,
    target_id: &str,
    output: &Path,
    history: Option<&Path>,
    classifier: &dyn RowClassifier,
) -> Result<LeakRunSummary, PipelineError> {
    let rows = read_rows(input)?;
    let index = build_aggregate_index(&rows, classifier);

    let outcome = match index.get(target_id) {
        None => {
            tracing::warn!(id = target_id, "target actor absent from ledger");
            BalanceOutcome::NotFound
        }
        Some(record) => {
            let graph = DistributionGraph::build(&rows, classifier)?;
            if graph.node_index(target_id).is_none() {
                BalanceOutcome::NotFound
            } else {
                let propagation = graph.propagate(target_id, record.treated_volume())?;
                BalanceOutcome::Found {
                    leak: propagation.leaked,
                }
            }
        }
    };

    let mut out = create_output(output)?;
    write_leak_report_single(target_id, outcome, &mut out)?;
    flush_output(out, output)?;

    if let Some(history_path) = history {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(history_path)
            .map_err(|source| PipelineError::Output {
                path: history_path.to_path_buf(),
                source,
            })?;
        let mut writer = BufWriter::new(file);
        append_leak_history(target_id, outcome.leak(), &mut writer)?;
        writer.flush().map_err(|source| PipelineError::Output {
            path: history_path.to_path_buf(),
            source,
        })?;
    }

    Ok(LeakRunSummary {
        leak: outcome.leak(),
        target_missing: outcome.is_miss(),
    })
}
