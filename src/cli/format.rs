//! Output formatting for CLI display.

use uuid::Uuid;

use crate::model::RunSummary;

/// The first eight hex digits of an ID.
pub(super) fn short_id(id: &Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// One line per run: short ID, start time, and counts.
pub(super) fn format_run(run: &RunSummary) -> String {
    let line = format!(
        "{}  {}  {} items in {} batches: {} present, {} absent",
        short_id(&run.id),
        run.started_at.strftime("%Y-%m-%d %H:%M:%S"),
        run.items,
        run.batches,
        run.present,
        run.absent,
    );
    if run.finished_at.is_some() {
        line
    } else {
        format!("{line} (unfinished)")
    }
}

/// Word counts as aligned `word  count` lines.
pub(super) fn format_word_counts(words: &[(&str, u64)]) -> String {
    let width = words.iter().map(|(w, _)| w.chars().count()).max().unwrap_or(0);
    words
        .iter()
        .map(|(word, n)| format!("{word:<width$}  {n}\n"))
        .collect()
}
