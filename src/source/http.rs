//! JSON API sources, such as a satellite scene metadata search.

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::model::WorkItem;

use super::{Result, SourceError};

/// Fetches `url` and extracts work items from the JSON response.
pub fn read_json_api(
    url: &str,
    pointer: &str,
    field: &str,
    limit: Option<usize>,
) -> Result<Vec<WorkItem>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()?;
    let body: Value = client.get(url).send()?.error_for_status()?.json()?;
    let items = extract_items(&body, pointer, field, limit)?;
    debug!(url, count = items.len(), "read work items");
    Ok(items)
}

/// Pulls `field` out of each element of the array at `pointer`.
///
/// Elements without the field, or where it isn't a string or number, are skipped.
pub fn extract_items(
    body: &Value,
    pointer: &str,
    field: &str,
    limit: Option<usize>,
) -> Result<Vec<WorkItem>> {
    let elements = body
        .pointer(pointer)
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::NotAnArray(display_pointer(pointer)))?;

    Ok(elements
        .iter()
        .filter_map(|e| match e.get(field)? {
            Value::String(s) if !s.is_empty() => Some(WorkItem::new(s.as_str())),
            Value::Number(n) => Some(WorkItem::new(n.to_string())),
            _ => None,
        })
        .take(limit.unwrap_or(usize::MAX))
        .collect())
}

fn display_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "top level".to_string()
    } else {
        format!("`{pointer}`")
    }
}
