//! Work-item sources: enumerate identifiers from a remote metadata query.
//!
//! Each source kind has its own submodule and returns a bounded, ordered
//! list of work items.

mod http;
mod tsv;

pub use http::read_json_api;
pub use tsv::{read_tsv, read_tsv_file};

use crate::model::WorkItem;

/// Errors that can occur while enumerating work items.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("no array at {0} in response")]
    NotAnArray(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Tsv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = core::result::Result<T, SourceError>;

/// Where work items come from.
#[derive(Debug, Clone)]
pub enum Source {
    /// A tab-separated file with a header row; one column holds the items.
    Tsv {
        path: std::path::PathBuf,
        column: String,
    },

    /// An HTTP endpoint returning JSON. `pointer` locates the array
    /// (empty for a top-level array); `field` names the item in each element.
    JsonApi {
        url: String,
        pointer: String,
        field: String,
    },
}

impl Source {
    /// Reads up to `limit` work items (all when `None`).
    pub fn read(&self, limit: Option<usize>) -> Result<Vec<WorkItem>> {
        match self {
            Self::Tsv { path, column } => read_tsv_file(path, column, limit),
            Self::JsonApi {
                url,
                pointer,
                field,
            } => read_json_api(url, pointer, field, limit),
        }
    }
}
