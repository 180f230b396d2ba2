//! Offline training pipeline: dataset -> normalizer -> TF-IDF -> logistic
//! regression -> artifact pair.

use crate::artifacts::{self, ArtifactPaths};
use crate::classifier::{LogisticRegression, LogisticRegressionConfig};
use crate::dataset::{self, ClassCounts, LabeledReview};
use crate::error::{Result, SentimentError};
use crate::normalizer::Normalizer;
use crate::vectorizer::{FeatureVector, TfidfVectorizer, VectorizerConfig};
use rayon::prelude::*;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Hyperparameters for one training run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainingConfig {
    /// Vocabulary and n-gram settings.
    pub vectorizer: VectorizerConfig,
    /// Regularization and solver settings.
    pub classifier: LogisticRegressionConfig,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Rows used for fitting.
    pub documents: usize,
    /// Positive rows.
    pub positives: usize,
    /// Negative rows.
    pub negatives: usize,
    /// Feature dimension of the fitted vectorizer.
    pub vocabulary_size: usize,
    /// Solver iterations.
    pub iterations: usize,
    /// Whether the solver reached its tolerance.
    pub converged: bool,
    /// Accuracy on the training rows themselves.
    pub training_accuracy: f64,
}

/// Fitted vectorizer and classifier from one run.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    /// Fitted vectorizer.
    pub vectorizer: TfidfVectorizer,
    /// Fitted classifier.
    pub classifier: LogisticRegression,
    /// Run summary.
    pub report: TrainingReport,
}

/// Runs the pipeline with a fixed normalizer and configuration.
pub struct TrainingPipeline {
    normalizer: Normalizer,
    config: TrainingConfig,
}

impl TrainingPipeline {
    /// Creates a pipeline.
    pub fn new(normalizer: Normalizer, config: TrainingConfig) -> Self {
        Self { normalizer, config }
    }

    /// Active configuration.
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Fits both stages in memory.
    pub fn fit(&self, rows: &[LabeledReview]) -> Result<TrainedModel> {
        if rows.is_empty() {
            return Err(SentimentError::EmptyDataset);
        }
        let counts = ClassCounts::of(rows);
        if counts.negative == 0 {
            return Err(SentimentError::SingleClass("positive"));
        }
        if counts.positive == 0 {
            return Err(SentimentError::SingleClass("negative"));
        }

        let started = Instant::now();
        let corpus: Vec<String> = rows
            .par_iter()
            .map(|row| self.normalizer.normalize(&row.review))
            .collect();
        let labels: Vec<u8> = rows.iter().map(|row| row.sentiment.class()).collect();
        debug!(
            documents = corpus.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "normalized corpus"
        );

        let vectorizer = TfidfVectorizer::fit(self.config.vectorizer, &corpus)?;
        let features: Vec<FeatureVector> = corpus
            .par_iter()
            .map(|doc| vectorizer.transform(doc))
            .collect();
        debug!(features = vectorizer.dim(), "fitted vectorizer");

        let (classifier, fit) = LogisticRegression::fit(&self.config.classifier, &features, &labels)?;

        let mut correct = 0usize;
        for (sample, &label) in features.iter().zip(&labels) {
            if classifier.predict(sample)? == label {
                correct += 1;
            }
        }
        let report = TrainingReport {
            documents: rows.len(),
            positives: counts.positive,
            negatives: counts.negative,
            vocabulary_size: vectorizer.dim(),
            iterations: fit.iterations,
            converged: fit.converged,
            training_accuracy: correct as f64 / rows.len() as f64,
        };
        info!(
            documents = report.documents,
            vocabulary = report.vocabulary_size,
            iterations = report.iterations,
            converged = report.converged,
            accuracy = report.training_accuracy,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "training finished"
        );
        Ok(TrainedModel {
            vectorizer,
            classifier,
            report,
        })
    }

    /// Fits and writes the artifact pair into `out_dir`.
    pub fn fit_and_save(
        &self,
        rows: &[LabeledReview],
        out_dir: impl AsRef<Path>,
    ) -> Result<(TrainingReport, ArtifactPaths)> {
        let trained = self.fit(rows)?;
        let paths = artifacts::save_pair(
            out_dir,
            &self.normalizer,
            &trained.vectorizer,
            &trained.classifier,
        )?;
        Ok((trained.report, paths))
    }

    /// Loads `dataset`, fits, and writes the artifact pair into `out_dir`.
    pub fn run(
        &self,
        dataset: impl AsRef<Path>,
        out_dir: impl AsRef<Path>,
    ) -> Result<(TrainingReport, ArtifactPaths)> {
        let rows = dataset::load(dataset)?;
        self.fit_and_save(&rows, out_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Sentiment;

    fn rows() -> Vec<LabeledReview> {
        vec![
            LabeledReview::new("A wonderful, brilliant film.", Sentiment::Positive),
            LabeledReview::new("Brilliant acting and a wonderful story!", Sentiment::Positive),
            LabeledReview::new("Terrible and boring.", Sentiment::Negative),
            LabeledReview::new("A boring, terrible waste of time.", Sentiment::Negative),
        ]
    }

    #[test]
    fn fits_the_training_rows() {
        let pipeline = TrainingPipeline::new(Normalizer::new(), TrainingConfig::default());
        let trained = pipeline.fit(&rows()).unwrap();
        assert_eq!(trained.report.documents, 4);
        assert_eq!(trained.report.positives, 2);
        assert_eq!(trained.classifier.n_features(), trained.vectorizer.dim());
        assert_eq!(trained.report.training_accuracy, 1.0);
    }

    #[test]
    fn rejects_degenerate_datasets() {
        let pipeline = TrainingPipeline::new(Normalizer::new(), TrainingConfig::default());
        assert!(matches!(pipeline.fit(&[]), Err(SentimentError::EmptyDataset)));

        let positives: Vec<_> = rows()
            .into_iter()
            .filter(|r| r.sentiment == Sentiment::Positive)
            .collect();
        assert!(matches!(
            pipeline.fit(&positives),
            Err(SentimentError::SingleClass("positive"))
        ));

        let markup = vec![
            LabeledReview::new("<br />", Sentiment::Positive),
            LabeledReview::new("!!!", Sentiment::Negative),
        ];
        assert!(matches!(
            pipeline.fit(&markup),
            Err(SentimentError::EmptyVocabulary)
        ));
    }
}
