#![warn(missing_docs)]
//! Core library for the review sentiment classifier: text normalization,
//! TF-IDF features, logistic regression, artifact persistence, training and
//! the HTTP prediction service.

pub mod api;
pub mod artifacts;
pub mod classifier;
pub mod dataset;
pub mod error;
pub mod inference;
pub mod label;
pub mod logging;
pub mod normalizer;
pub mod stemmer;
pub mod stopwords;
pub mod training;
pub mod vectorizer;

pub use api::{cors_layer, router};
pub use artifacts::{ArtifactPaths, MODEL_FILE, VECTORIZER_FILE};
pub use classifier::{FitReport, LogisticRegression, LogisticRegressionConfig};
pub use dataset::{DatasetFormat, LabeledReview};
pub use error::{Result, SentimentError};
pub use inference::{Prediction, SentimentService};
pub use label::Sentiment;
pub use normalizer::Normalizer;
pub use training::{TrainedModel, TrainingConfig, TrainingPipeline, TrainingReport};
pub use vectorizer::{FeatureVector, TfidfVectorizer, VectorizerConfig};
