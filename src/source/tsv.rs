//! Tab-separated sources, such as a dataset index in object storage.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::model::WorkItem;

use super::{Result, SourceError};

/// Reads work items from a TSV file on disk.
pub fn read_tsv_file(path: &Path, column: &str, limit: Option<usize>) -> Result<Vec<WorkItem>> {
    let file = File::open(path)?;
    let items = read_tsv(file, column, limit)?;
    debug!(path = %path.display(), count = items.len(), "read work items");
    Ok(items)
}

/// Reads work items from the named column of tab-separated data.
///
/// Blank cells are skipped; rows shorter than the header are tolerated.
pub fn read_tsv<R: Read>(reader: R, column: &str, limit: Option<usize>) -> Result<Vec<WorkItem>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let index = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| SourceError::ColumnNotFound(column.to_string()))?;

    let limit = limit.unwrap_or(usize::MAX);
    let mut items = Vec::new();
    for row in reader.records() {
        if items.len() >= limit {
            break;
        }
        let row = row?;
        if let Some(cell) = row.get(index)
            && !cell.trim().is_empty()
        {
            items.push(WorkItem::new(cell.trim()));
        }
    }
    Ok(items)
}
