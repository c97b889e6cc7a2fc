//! The `run` command: enumerate, dispatch, store.

use std::path::PathBuf;

use clap::{ArgGroup, Args};

use crate::config::Config;
use crate::executor::ProcessExecutor;
use crate::pipeline::{self, RunOptions};
use crate::source::Source;
use crate::storage::Storage;

use super::format::format_run;

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("source").required(true).args(["tsv", "api"])))]
pub struct RunArgs {
    /// Read work items from a tab-separated file.
    #[arg(long)]
    pub tsv: Option<PathBuf>,

    /// TSV column holding the work items.
    #[arg(long, default_value = "url", requires = "tsv")]
    pub column: String,

    /// Read work items from a JSON API.
    #[arg(long)]
    pub api: Option<String>,

    /// JSON pointer to the array of elements (e.g. `/results`). Empty for a
    /// top-level array.
    #[arg(long, default_value = "", requires = "api")]
    pub pointer: String,

    /// Field of each element holding the work item.
    #[arg(long, default_value = "id", requires = "api")]
    pub field: String,

    /// Maximum number of work items.
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of batches. Defaults to `partitions` from the config.
    #[arg(long)]
    pub partitions: Option<usize>,

    /// Record field used as the store key. Defaults to `key-field` from the
    /// config; records without it are keyed by their work item.
    #[arg(long)]
    pub key_field: Option<String>,

    /// Maximum tasks running at once within a batch. Defaults to
    /// `max-in-flight` from the config.
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub max_in_flight: Option<u16>,

    /// Command run per work item, with the item appended.
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

impl RunArgs {
    fn source(&self) -> Option<Source> {
        if let Some(path) = &self.tsv {
            return Some(Source::Tsv {
                path: path.clone(),
                column: self.column.clone(),
            });
        }
        self.api.as_ref().map(|url| Source::JsonApi {
            url: url.clone(),
            pointer: self.pointer.clone(),
            field: self.field.clone(),
        })
    }

    fn options(&self, config: &Config) -> RunOptions {
        RunOptions {
            partitions: self.partitions.unwrap_or(config.partitions),
            key_field: self.key_field.clone().or_else(|| config.key_field.clone()),
        }
    }

    fn max_in_flight(&self, config: &Config) -> usize {
        self.max_in_flight.map_or(config.max_in_flight, usize::from)
    }
}

pub(super) fn cmd_run(config: &Config, storage: &Storage, args: &RunArgs) -> Result<(), String> {
    let source = args.source().ok_or("a source is required: --tsv or --api")?;
    let executor = ProcessExecutor::from_command_line(&args.command)
        .ok_or("a command is required after --")?
        .with_max_in_flight(args.max_in_flight(config));

    let items = source
        .read(args.limit)
        .map_err(|e| format!("failed to read work items: {e}"))?;
    if items.is_empty() {
        eprintln!("No work items");
    }

    let outcome = pipeline::run(&items, &executor, storage, &args.options(config))
        .map_err(|e| format!("run failed: {e}"))?;

    eprintln!("{}", format_run(&outcome.summary));
    println!("{}", outcome.summary.id);
    Ok(())
}
