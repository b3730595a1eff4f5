//! waternet - water-network ledger analyzer CLI
//!
//! Thin front-end over `water-network-core-rs`: parses arguments, selects
//! the classification dialect, runs one pipeline invocation and maps
//! library errors to distinct process exit codes:
//!
//! - 0: success
//! - 2: input file not found / not readable
//! - 3: output file not writable
//! - 4: leak target identifier not found (the report is still written)
//! - 5: internal graph inconsistency (missing upstream, cycle, depth)

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use water_network_core_rs::{
    pipeline, KeywordClassifier, LeakTarget, Metric, PipelineError, PrefixClassifier,
    RowClassifier,
};

const EXIT_INPUT: u8 = 2;
const EXIT_OUTPUT: u8 = 3;
const EXIT_NOT_FOUND: u8 = 4;
const EXIT_INCONSISTENT: u8 = 5;

#[derive(Parser, Debug)]
#[command(name = "waternet", version, about = "Water-distribution ledger analyzer")]
struct Args {
    /// Ledger file (semicolon-delimited, one header line)
    #[arg(long, global = true, default_value = "ledger.csv")]
    input: PathBuf,

    /// Classification dialect for ledger rows
    #[arg(long, global = true, value_enum, default_value = "keyword")]
    classifier: Dialect,

    /// Optional JSON file overriding the dialect's keyword/prefix tables
    #[arg(long, global = true)]
    classifier_config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Dialect {
    /// Descriptive keywords in the upstream field ("Source", "Plant", ...)
    Keyword,
    /// Identifier prefixes ("source_", "usine_", ...)
    Prefix,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MetricArg {
    /// Declared maximum capacity (descending order)
    Max,
    /// Captured volume from sources (ascending order)
    Source,
    /// Treated volume after losses (ascending order)
    Real,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Max => Metric::MaxCapacity,
            MetricArg::Source => Metric::Captured,
            MetricArg::Real => Metric::Treated,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a per-actor aggregate volume report
    Aggregate {
        /// Metric to export
        #[arg(long, value_enum)]
        metric: MetricArg,

        /// Report file to create
        #[arg(long, default_value = "output/volumes.dat")]
        output: PathBuf,
    },

    /// Estimate leaks, by direct balance or graph propagation
    Leak {
        /// Actor to query (omit with --all)
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        target: Option<String>,

        /// Report every actor with a strictly positive leak
        #[arg(long)]
        all: bool,

        /// Propagate the actor's treated volume through the distribution
        /// graph instead of computing a direct balance (requires --target)
        #[arg(long, conflicts_with = "all")]
        propagate: bool,

        /// Report file to create
        #[arg(long, default_value = "output/leaks.dat")]
        output: PathBuf,

        /// Append-only leak history file (propagation mode only)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Unit divisor applied to batch-mode volumes
        #[arg(long, default_value_t = 1.0)]
        divisor: f64,
    },
}

fn load_classifier(
    dialect: Dialect,
    config: Option<&PathBuf>,
) -> Result<Box<dyn RowClassifier>> {
    let json = config
        .map(|path| {
            fs::read_to_string(path)
                .with_context(|| format!("cannot read classifier config '{}'", path.display()))
        })
        .transpose()?;

    Ok(match (dialect, json) {
        (Dialect::Keyword, None) => Box::new(KeywordClassifier::default()),
        (Dialect::Keyword, Some(json)) => {
            Box::new(KeywordClassifier::from_json(&json).context("invalid keyword tables")?)
        }
        (Dialect::Prefix, None) => Box::new(PrefixClassifier::default()),
        (Dialect::Prefix, Some(json)) => {
            Box::new(PrefixClassifier::from_json(&json).context("invalid prefix tables")?)
        }
    })
}

fn ensure_parent_dir(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create directory '{}'", parent.display()))?;
        }
    }
    Ok(())
}

fn exit_code_for(err: &PipelineError) -> u8 {
    match err {
        PipelineError::Ingest(_) => EXIT_INPUT,
        PipelineError::Output { .. } | PipelineError::Report(_) => EXIT_OUTPUT,
        PipelineError::Graph(_) | PipelineError::Propagation(_) => EXIT_INCONSISTENT,
    }
}

fn run(args: Args) -> Result<u8> {
    let classifier = load_classifier(args.classifier, args.classifier_config.as_ref())?;

    match args.command {
        Command::Aggregate { metric, output } => {
            ensure_parent_dir(&output)?;
            match pipeline::run_aggregate(&args.input, metric.into(), &output, classifier.as_ref())
            {
                Ok(()) => {
                    println!("Aggregate report written to {}", output.display());
                    Ok(0)
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    Ok(exit_code_for(&err))
                }
            }
        }
        Command::Leak {
            target,
            all,
            propagate,
            output,
            history,
            divisor,
        } => {
            ensure_parent_dir(&output)?;
            let result = if propagate {
                // clap guarantees a target in propagation mode
                let target = target.context("--propagate requires --target")?;
                pipeline::run_leak_propagation(
                    &args.input,
                    &target,
                    &output,
                    history.as_deref(),
                    classifier.as_ref(),
                )
            } else {
                let leak_target = if all {
                    LeakTarget::All
                } else {
                    LeakTarget::Single(target.context("either --target or --all is required")?)
                };
                pipeline::run_leak_balance(
                    &args.input,
                    &leak_target,
                    &output,
                    divisor,
                    classifier.as_ref(),
                )
            };

            match result {
                Ok(summary) => {
                    println!("Leak report written to {}", output.display());
                    if summary.target_missing {
                        eprintln!("warning: target actor not found in ledger, leak reported as 0");
                        Ok(EXIT_NOT_FOUND)
                    } else {
                        println!("Total leak: {:.3}", summary.leak);
                        Ok(0)
                    }
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    Ok(exit_code_for(&err))
                }
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
