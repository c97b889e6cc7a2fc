//! CLI interface for fanout.
//!
//! Each subcommand is non-interactive: arguments in, plain output on stdout,
//! progress logs on stderr.
//!
//! - `fanout run`: enumerate work items, dispatch them in batches, store results.
//! - `fanout series|words|report`: aggregate stored records.
//! - `fanout get`: print one stored record.
//! - `fanout runs`: list past runs.
//!
//! `--run` takes a full run UUID or an unambiguous prefix.

mod format;
mod query;
mod run;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use uuid::Uuid;

pub use run::RunArgs;

use crate::config::Config;
use crate::report::ReportKind;
use crate::storage::Storage;

/// fanout: map work items over a parallel executor and aggregate the results.
#[derive(Debug, Parser)]
#[command(name = "fanout", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Storage root. Overrides `storage-root` in the config file.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: scoring news articles
  1. fanout run --tsv events.tsv --column url --key-field link -- score-article
     → prints a run ID (e.g. 5d1c09ab)
  2. fanout words --field words --top 20
  3. fanout report sentiment

Workflow: NDVI time series
  1. fanout run --api "https://api.example/search?limit=50" --pointer /results \
       --field scene_id -- ndvi-for-scene
  2. fanout series --field ndvi --run 5d1
  3. fanout report ndvi"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a pipeline: enumerate work items, dispatch them, store the results.
    ///
    /// The command after `--` is run once per work item with the item as its
    /// last argument, and must print a JSON object. Items whose command fails
    /// are counted as absent; the run carries on.
    Run(RunArgs),

    /// Print a numeric field of stored records, one value per line.
    Series {
        /// Field to project.
        #[arg(long)]
        field: String,

        /// Restrict to one run.
        #[arg(long)]
        run: Option<String>,
    },

    /// Print the most frequent words across stored records.
    Words {
        /// List field holding `word:count` tokens.
        #[arg(long, default_value = "words")]
        field: String,

        /// Number of words to show. Defaults to `top-k` from the config.
        #[arg(long)]
        top: Option<usize>,

        /// Restrict to one run.
        #[arg(long)]
        run: Option<String>,
    },

    /// Render an HTML report of stored records and publish it to object storage.
    Report {
        /// Which kind of records to summarize.
        #[arg(value_enum)]
        kind: ReportArg,

        /// Words shown per article. Defaults to `top-k` from the config.
        #[arg(long)]
        top: Option<usize>,

        /// Restrict to one run.
        #[arg(long)]
        run: Option<String>,
    },

    /// Print one stored record as JSON.
    Get {
        /// The record's key.
        key: String,
    },

    /// List past runs.
    Runs,
}

/// CLI-facing report kind, mapped to the domain `ReportKind`.
#[derive(Debug, Clone, ValueEnum)]
pub enum ReportArg {
    /// Article links, sentiment scores and word frequencies.
    Sentiment,
    /// Scene dates, cloud cover and NDVI.
    Ndvi,
}

impl ReportArg {
    fn to_domain(&self) -> ReportKind {
        match self {
            Self::Sentiment => ReportKind::Sentiment,
            Self::Ndvi => ReportKind::Ndvi,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<(), String> {
    match cli.command {
        Command::Run(args) => run::cmd_run(config, storage, &args),
        Command::Series { field, run } => {
            let run_id = resolve_optional_run(storage, run.as_deref())?;
            query::cmd_series(storage, &field, run_id)
        }
        Command::Words { field, top, run } => {
            let run_id = resolve_optional_run(storage, run.as_deref())?;
            query::cmd_words(storage, &field, top.unwrap_or(config.top_k), run_id)
        }
        Command::Report { kind, top, run } => {
            let run_id = resolve_optional_run(storage, run.as_deref())?;
            query::cmd_report(
                storage,
                kind.to_domain(),
                top.unwrap_or(config.top_k),
                run_id,
            )
        }
        Command::Get { key } => query::cmd_get(storage, &key),
        Command::Runs => query::cmd_runs(storage),
    }
}

fn resolve_optional_run(storage: &Storage, reference: Option<&str>) -> Result<Option<Uuid>, String> {
    reference.map(|r| resolve_run(storage, r)).transpose()
}

/// Resolve a run reference (full UUID or prefix) to a run ID.
fn resolve_run(storage: &Storage, reference: &str) -> Result<Uuid, String> {
    let runs = storage
        .list_runs()
        .map_err(|e| format!("failed to list runs: {e}"))?;

    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return runs
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.id)
            .ok_or_else(|| format!("run not found: {id}"));
    }

    let matches: Vec<Uuid> = runs
        .iter()
        .map(|r| r.id)
        .filter(|id| id.to_string().starts_with(reference))
        .collect();

    match matches.as_slice() {
        [] => Err(format!("no run matching '{reference}'")),
        [id] => Ok(*id),
        ids => {
            let short: Vec<String> = ids.iter().map(format::short_id).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {} runs: {}",
                ids.len(),
                short.join(", ")
            ))
        }
    }
}
