//! Aggregation: fold result records into series and word counts.
//!
//! Absent records are dropped before anything is projected. Malformed fields
//! and tokens are skipped; one bad record never fails the whole aggregation.

use std::collections::BTreeMap;

use crate::model::ResultRecord;

/// Drops absent records, keeping the rest in order.
pub fn present<'a, I>(records: I) -> Vec<&'a ResultRecord>
where
    I: IntoIterator<Item = &'a Option<ResultRecord>>,
{
    records.into_iter().filter_map(Option::as_ref).collect()
}

/// Projects a numeric field across all present records.
///
/// Records where the field is missing or not numeric are skipped.
pub fn series<'a, I>(records: I, field: &str) -> Vec<f64>
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    records
        .into_iter()
        .filter_map(|r| r.number(field))
        .collect()
}

/// Sums `"word:count"` tokens from a list field across all records.
pub fn word_counts<'a, I>(records: I, field: &str) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let mut counts = BTreeMap::new();
    for record in records {
        add_tokens(&mut counts, record.strings(field));
    }
    counts
}

/// Adds well-formed tokens to `counts`, skipping the rest.
///
/// Counts saturate at `u64::MAX`.
pub fn add_tokens<'a>(counts: &mut BTreeMap<String, u64>, tokens: impl IntoIterator<Item = &'a str>) {
    for token in tokens {
        if let Some((word, n)) = parse_token(token) {
            let total = counts.entry(word.to_string()).or_insert(0);
            *total = total.saturating_add(n);
        }
    }
}

/// Parses a `"word:count"` token.
///
/// Splits on the last colon, so the word itself may contain colons.
/// Returns `None` for an empty word or a count that isn't a non-negative integer.
pub fn parse_token(token: &str) -> Option<(&str, u64)> {
    let (word, count) = token.rsplit_once(':')?;
    let word = word.trim();
    if word.is_empty() {
        return None;
    }
    let count = count.trim().parse().ok()?;
    Some((word, count))
}

/// The `k` most frequent tokens: descending count, ties by ascending token.
pub fn top_k(counts: &BTreeMap<String, u64>, k: usize) -> Vec<(&str, u64)> {
    let mut ranked: Vec<(&str, u64)> = counts.iter().map(|(w, &n)| (w.as_str(), n)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(k);
    ranked
}

/// Arithmetic mean, or `None` for an empty series.
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    fn record(value: Value) -> ResultRecord {
        ResultRecord::from_value(value).unwrap()
    }

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<String, u64> {
        pairs.iter().map(|&(w, n)| (w.to_string(), n)).collect()
    }

    #[test]
    fn word_counts_sum_across_tokens() {
        let records = [record(json!({"words": ["a:3", "b:2", "a:1"]}))];
        assert_eq!(word_counts(&records, "words"), counts(&[("a", 4), ("b", 2)]));
    }

    #[test]
    fn word_counts_sum_across_records() {
        let records = [
            record(json!({"words": ["rain:2", "flood:1"]})),
            record(json!({"words": ["rain:5"]})),
            record(json!({"link": "no words here"})),
        ];
        assert_eq!(
            word_counts(&records, "words"),
            counts(&[("flood", 1), ("rain", 7)])
        );
    }

    #[test]
    fn malformed_tokens_are_skipped() {
        let records = [record(json!({
            "words": ["a:3", "nocolon", ":4", "b:x", "c:-1", "d:2", 5]
        }))];
        assert_eq!(word_counts(&records, "words"), counts(&[("a", 3), ("d", 2)]));
    }

    #[test]
    fn huge_counts_saturate() {
        let records = [
            record(json!({"words": ["a:18446744073709551615", "a:1", "b:1"]})),
            record(json!({"words": ["a:7"]})),
        ];
        assert_eq!(
            word_counts(&records, "words"),
            counts(&[("a", u64::MAX), ("b", 1)])
        );
    }

    #[test]
    fn parse_token_splits_on_last_colon() {
        assert_eq!(parse_token("http://x:2"), Some(("http://x", 2)));
        assert_eq!(parse_token(" word : 7 "), Some(("word", 7)));
        assert_eq!(parse_token("word:"), None);
    }

    #[test]
    fn top_k_breaks_ties_by_token() {
        let c = counts(&[("a", 4), ("b", 2), ("c", 4)]);
        assert_eq!(top_k(&c, 2), vec![("a", 4), ("c", 4)]);
    }

    #[test]
    fn top_k_larger_than_vocabulary() {
        let c = counts(&[("b", 1), ("a", 1)]);
        assert_eq!(top_k(&c, 10), vec![("a", 1), ("b", 1)]);
        assert!(top_k(&c, 0).is_empty());
    }

    #[test]
    fn absent_records_are_excluded_from_series() {
        let records = vec![
            Some(record(json!({"ndvi": 0.2}))),
            None,
            Some(record(json!({"ndvi": 0.4}))),
        ];
        let values = series(present(&records), "ndvi");
        assert_eq!(values, vec![0.2, 0.4]);
        assert!(values.len() < records.len());
    }

    #[test]
    fn series_skips_non_numeric_fields() {
        let records = [
            record(json!({"cloud": 10})),
            record(json!({"cloud": "n/a"})),
            record(json!({"cloud": "3.5"})),
            record(json!({})),
        ];
        assert_eq!(series(&records, "cloud"), vec![10.0, 3.5]);
    }

    #[test]
    fn series_skips_non_finite_strings() {
        let records = [
            record(json!({"ndvi": "NaN"})),
            record(json!({"ndvi": "inf"})),
            record(json!({"ndvi": "-infinity"})),
            record(json!({"ndvi": 0.5})),
        ];
        let values = series(&records, "ndvi");
        assert_eq!(values, vec![0.5]);
        assert_eq!(mean(&values), Some(0.5));
    }

    #[test]
    fn mean_of_series() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }
}
