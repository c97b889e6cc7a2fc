//! Result records: the structured output of processing one work item.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name → scalar or list, as produced by the mapped function.
///
/// The shape varies per pipeline. A sentiment record carries `link`,
/// `sentiment` and `words`; an NDVI record carries `date`, `cloud` and `ndvi`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultRecord(Map<String, Value>);

impl ResultRecord {
    /// Builds a record from a JSON value, if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// A field as a finite number. Numeric strings (`"12.5"`) are accepted;
    /// `"NaN"` and `"inf"` are not.
    pub fn number(&self, field: &str) -> Option<f64> {
        let n = match self.0.get(field)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        n.is_finite().then_some(n)
    }

    /// A field as display text. Strings are returned as-is, other scalars
    /// in their JSON form.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// A list field's string elements. Non-string elements are skipped.
    pub fn strings(&self, field: &str) -> Vec<&str> {
        match self.0.get(field) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for ResultRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}
