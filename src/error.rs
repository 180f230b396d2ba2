//! Error types shared by the training pipeline and the inference service.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the sentiment library.
#[derive(Error, Debug)]
pub enum SentimentError {
    /// The review was empty or whitespace-only; nothing was classified.
    #[error("Empty review")]
    EmptyReview,

    /// I/O error while reading a dataset or an artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV dataset could not be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON/JSONL payload could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Artifact payload failed to (de)serialize.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Artifact file is missing.
    #[error("Artifact not found: {0}")]
    ArtifactNotFound(PathBuf),

    /// Artifact bytes are not a valid artifact of the expected kind.
    #[error("Invalid artifact {path}: {reason}")]
    InvalidArtifact {
        /// File that failed validation.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// Vectorizer and model do not originate from the same training run.
    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),

    /// Dataset row carried a label other than positive/negative.
    #[error("Invalid label {label:?} at row {row}")]
    InvalidLabel {
        /// 1-based data row.
        row: usize,
        /// Raw label text.
        label: String,
    },

    /// Dataset row is missing a required column.
    #[error("Missing column {column:?} at row {row}")]
    MissingColumn {
        /// 1-based data row (0 for the header).
        row: usize,
        /// Column name.
        column: &'static str,
    },

    /// Dataset contained no rows.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// Dataset contained a single class; a binary model cannot be fit.
    #[error("Dataset contains only {0} examples")]
    SingleClass(&'static str),

    /// Vectorizer fit produced no terms.
    #[error("Vocabulary is empty; the corpus contains no usable terms")]
    EmptyVocabulary,

    /// Feature vector dimension differs from the model's.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the model was trained with.
        expected: usize,
        /// Dimension of the supplied vector.
        actual: usize,
    },

    /// Sparse entry outside the vector's dimension.
    #[error("Feature index {index} out of range for dimension {dim}")]
    FeatureIndexOutOfRange {
        /// Offending index.
        index: usize,
        /// Vector dimension.
        dim: usize,
    },

    /// The global tracing subscriber could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for sentiment operations.
pub type Result<T> = std::result::Result<T, SentimentError>;

impl From<bincode::Error> for SentimentError {
    fn from(err: bincode::Error) -> Self {
        SentimentError::Serialization(err.to_string())
    }
}
