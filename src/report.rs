//! HTML summaries of stored result records.
//!
//! Sentiment reports list each article with its score and most frequent
//! words; NDVI reports list each scene by date. Pages are askama templates
//! under `templates/`, so every interpolated value is HTML-escaped. The
//! rendered page is published to object storage under the hash of the
//! report name.

use std::collections::BTreeMap;
use std::path::PathBuf;

use askama::Template;

use crate::aggregate::{self, add_tokens, top_k};
use crate::model::ResultRecord;
use crate::storage::{Storage, StorageError};

/// Errors from rendering or publishing a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to render report: {0}")]
    Render(#[from] askama::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = core::result::Result<T, ReportError>;

/// Which pipeline's records a report summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Sentiment,
    Ndvi,
}

impl ReportKind {
    /// The source id the report's index page is stored under.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sentiment => "sentiment-report",
            Self::Ndvi => "ndvi-report",
        }
    }

    pub fn render(self, records: &[ResultRecord], top: usize) -> Result<String> {
        match self {
            Self::Sentiment => render_sentiment(records, top),
            Self::Ndvi => render_ndvi(records),
        }
    }
}

/// Renders and stores a report's `index.html`. Returns its path.
pub fn publish(
    storage: &Storage,
    kind: ReportKind,
    records: &[ResultRecord],
    top: usize,
) -> Result<PathBuf> {
    let html = kind.render(records, top)?;
    Ok(storage.put_object(kind.name(), "index.html", html.as_bytes())?)
}

/// Sentiment page: one row per article, then the top words overall.
#[derive(Template, Debug)]
#[template(path = "sentiment.html")]
struct SentimentPage<'a> {
    articles: &'a [ArticleRow],
    words: &'a [WordRow<'a>],
}

#[derive(Debug)]
struct ArticleRow {
    link: String,
    score: String,
    /// The article's own top words as `word:count, ...`.
    words: String,
}

#[derive(Debug)]
struct WordRow<'a> {
    word: &'a str,
    count: u64,
}

/// NDVI page: one row per scene, then the mean.
#[derive(Template, Debug)]
#[template(path = "ndvi.html")]
struct NdviPage<'a> {
    scenes: &'a [SceneRow],
    mean: &'a str,
}

#[derive(Debug)]
struct SceneRow {
    date: String,
    cloud: String,
    ndvi: String,
}

/// One row per article (link, sentiment, top words), then the overall
/// top words across every article.
pub fn render_sentiment(records: &[ResultRecord], top: usize) -> Result<String> {
    let articles: Vec<ArticleRow> = records
        .iter()
        .map(|record| {
            let mut counts = BTreeMap::new();
            add_tokens(&mut counts, record.strings("words"));
            let words = top_k(&counts, top)
                .iter()
                .map(|(w, n)| format!("{w}:{n}"))
                .collect::<Vec<_>>()
                .join(", ");

            ArticleRow {
                link: record.text("link").unwrap_or_default(),
                score: fmt_number(record.number("sentiment"), 3),
                words,
            }
        })
        .collect();

    let counts = aggregate::word_counts(records, "words");
    let words: Vec<WordRow<'_>> = top_k(&counts, top)
        .into_iter()
        .map(|(word, count)| WordRow { word, count })
        .collect();

    let page = SentimentPage {
        articles: &articles,
        words: &words,
    };
    Ok(page.render()?)
}

/// One row per scene sorted by date, then the mean NDVI.
pub fn render_ndvi(records: &[ResultRecord]) -> Result<String> {
    let mut sorted: Vec<&ResultRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.text("date").unwrap_or_default());

    let scenes: Vec<SceneRow> = sorted
        .iter()
        .map(|record| SceneRow {
            date: record.text("date").unwrap_or_default(),
            cloud: fmt_number(record.number("cloud"), 1),
            ndvi: fmt_number(record.number("ndvi"), 4),
        })
        .collect();

    let values = aggregate::series(sorted.iter().copied(), "ndvi");
    let mean = fmt_number(aggregate::mean(&values), 4);

    let page = NdviPage {
        scenes: &scenes,
        mean: &mean,
    };
    Ok(page.render()?)
}

fn fmt_number(n: Option<f64>, precision: usize) -> String {
    n.map_or_else(|| "-".to_string(), |n| format!("{n:.precision$}"))
}
