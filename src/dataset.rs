//! Labeled review datasets (CSV or JSONL).

use crate::error::{Result, SentimentError};
use crate::label::Sentiment;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::info;

const REVIEW_COLUMN: &str = "review";
const SENTIMENT_COLUMN: &str = "sentiment";

/// One training row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledReview {
    /// Raw review text.
    pub review: String,
    /// Ground-truth label.
    pub sentiment: Sentiment,
}

impl LabeledReview {
    /// Convenience constructor.
    pub fn new(review: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            review: review.into(),
            sentiment,
        }
    }
}

/// Supported on-disk layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    /// Header row with `review` and `sentiment` columns.
    Csv,
    /// One JSON object per line.
    JsonLines,
}

impl DatasetFormat {
    /// Picks the format from the file extension; anything unknown is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("jsonl") | Some("ndjson") => Self::JsonLines,
            _ => Self::Csv,
        }
    }
}

/// Class balance of a dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassCounts {
    /// Rows labeled positive.
    pub positive: usize,
    /// Rows labeled negative.
    pub negative: usize,
}

impl ClassCounts {
    /// Tallies labels.
    pub fn of(rows: &[LabeledReview]) -> Self {
        let positive = rows
            .iter()
            .filter(|row| row.sentiment == Sentiment::Positive)
            .count();
        Self {
            positive,
            negative: rows.len() - positive,
        }
    }
}

/// Loads a dataset file, dispatching on its extension.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<LabeledReview>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let rows = match DatasetFormat::from_path(path) {
        DatasetFormat::Csv => read_csv(file)?,
        DatasetFormat::JsonLines => read_jsonl(BufReader::new(file))?,
    };
    let counts = ClassCounts::of(&rows);
    info!(
        path = %path.display(),
        rows = rows.len(),
        positive = counts.positive,
        negative = counts.negative,
        "loaded dataset"
    );
    Ok(rows)
}

/// Parses CSV with a header row; extra columns are ignored.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<LabeledReview>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = csv.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
            .ok_or(SentimentError::MissingColumn { row: 0, column: name })
    };
    let review_idx = column(REVIEW_COLUMN)?;
    let sentiment_idx = column(SENTIMENT_COLUMN)?;

    let mut rows = Vec::new();
    for (idx, record) in csv.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        let review = record.get(review_idx).ok_or(SentimentError::MissingColumn {
            row,
            column: REVIEW_COLUMN,
        })?;
        let label = record.get(sentiment_idx).ok_or(SentimentError::MissingColumn {
            row,
            column: SENTIMENT_COLUMN,
        })?;
        rows.push(LabeledReview::new(review, parse_label(row, label)?));
    }
    Ok(rows)
}

#[derive(Deserialize)]
struct JsonRow {
    review: Option<String>,
    sentiment: Option<String>,
}

/// Parses JSON lines; blank lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Vec<LabeledReview>> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let row = idx + 1;
        let parsed: JsonRow = serde_json::from_str(&line)?;
        let review = parsed.review.ok_or(SentimentError::MissingColumn {
            row,
            column: REVIEW_COLUMN,
        })?;
        let label = parsed.sentiment.ok_or(SentimentError::MissingColumn {
            row,
            column: SENTIMENT_COLUMN,
        })?;
        rows.push(LabeledReview::new(review, parse_label(row, &label)?));
    }
    Ok(rows)
}

fn parse_label(row: usize, raw: &str) -> Result<Sentiment> {
    Sentiment::from_label(raw).ok_or_else(|| SentimentError::InvalidLabel {
        row,
        label: raw.to_string(),
    })
}
