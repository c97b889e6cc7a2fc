//! Commands over stored records: series, words, report, get, runs.

use uuid::Uuid;

use crate::aggregate;
use crate::model::ResultRecord;
use crate::report::{self, ReportKind};
use crate::storage::Storage;

use super::format::{format_run, format_word_counts};

fn load_records(storage: &Storage, run_id: Option<Uuid>) -> Result<Vec<ResultRecord>, String> {
    storage
        .scan_records(run_id)
        .map_err(|e| format!("failed to read records: {e}"))
}

pub(super) fn cmd_series(storage: &Storage, field: &str, run_id: Option<Uuid>) -> Result<(), String> {
    let records = load_records(storage, run_id)?;
    for value in aggregate::series(&records, field) {
        println!("{value}");
    }
    Ok(())
}

pub(super) fn cmd_words(
    storage: &Storage,
    field: &str,
    top: usize,
    run_id: Option<Uuid>,
) -> Result<(), String> {
    let records = load_records(storage, run_id)?;
    let counts = aggregate::word_counts(&records, field);
    if counts.is_empty() {
        println!("No words");
        return Ok(());
    }
    print!("{}", format_word_counts(&aggregate::top_k(&counts, top)));
    Ok(())
}

pub(super) fn cmd_report(
    storage: &Storage,
    kind: ReportKind,
    top: usize,
    run_id: Option<Uuid>,
) -> Result<(), String> {
    let records = load_records(storage, run_id)?;
    let path = report::publish(storage, kind, &records, top)
        .map_err(|e| format!("failed to publish report: {e}"))?;
    eprintln!("Rendered {} records", records.len());
    println!("{}", path.display());
    Ok(())
}

pub(super) fn cmd_get(storage: &Storage, key: &str) -> Result<(), String> {
    let record = storage
        .get_record(key)
        .map_err(|e| format!("failed to read record: {e}"))?
        .ok_or_else(|| format!("no record for '{key}'"))?;
    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| format!("failed to encode record: {e}"))?;
    println!("{json}");
    Ok(())
}

pub(super) fn cmd_runs(storage: &Storage) -> Result<(), String> {
    let runs = storage
        .list_runs()
        .map_err(|e| format!("failed to list runs: {e}"))?;

    if runs.is_empty() {
        println!("No runs");
        return Ok(());
    }

    for run in &runs {
        println!("{}", format_run(run));
    }
    Ok(())
}
