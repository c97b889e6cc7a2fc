//! Run summaries: what one pass of the pipeline did.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of a single pipeline run.
///
/// A run is recorded as soon as it starts; `finished_at` stays unset until
/// every batch has been dispatched and stored, so an aborted run keeps the
/// counts of the batches that did complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub id: Uuid,
    pub started_at: Timestamp,
    pub finished_at: Option<Timestamp>,

    /// Work items enumerated by the source.
    pub items: usize,

    /// Batches dispatched to the executor.
    pub batches: usize,

    /// Items whose remote computation produced a record.
    pub present: usize,

    /// Items whose remote computation failed.
    pub absent: usize,
}
