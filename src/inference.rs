//! Ready-to-serve sentiment predictor.

use crate::artifacts;
use crate::classifier::LogisticRegression;
use crate::error::{Result, SentimentError};
use crate::label::Sentiment;
use crate::normalizer::Normalizer;
use crate::vectorizer::TfidfVectorizer;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Outcome of classifying one review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted label.
    pub sentiment: Sentiment,
    /// Probability of the positive class.
    pub probability: f64,
}

/// Normalizer, vectorizer and classifier from one training run.
///
/// A value of this type only exists once the artifact pair was validated,
/// so every method can assume a consistent feature space. It is immutable
/// and meant to be shared behind an `Arc`.
#[derive(Debug)]
pub struct SentimentService {
    normalizer: Normalizer,
    vectorizer: TfidfVectorizer,
    classifier: LogisticRegression,
}

impl SentimentService {
    /// Loads and validates the artifact pair in `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let normalizer = Normalizer::new();
        let (vectorizer, classifier) = artifacts::load_pair(dir, &normalizer)?;
        info!(
            dir = %dir.display(),
            features = vectorizer.dim(),
            "sentiment model ready"
        );
        Self::from_parts(normalizer, vectorizer, classifier)
    }

    /// Assembles a service from in-memory parts.
    pub fn from_parts(
        normalizer: Normalizer,
        vectorizer: TfidfVectorizer,
        classifier: LogisticRegression,
    ) -> Result<Self> {
        if classifier.n_features() != vectorizer.dim() {
            return Err(SentimentError::DimensionMismatch {
                expected: classifier.n_features(),
                actual: vectorizer.dim(),
            });
        }
        Ok(Self {
            normalizer,
            vectorizer,
            classifier,
        })
    }

    /// Classifies one raw review.
    ///
    /// Whitespace-only input is rejected with [`SentimentError::EmptyReview`]
    /// before any work is done.
    pub fn predict(&self, review: &str) -> Result<Prediction> {
        if review.trim().is_empty() {
            return Err(SentimentError::EmptyReview);
        }
        let normalized = self.normalizer.normalize(review);
        let features = self.vectorizer.transform(&normalized);
        let decision = self.classifier.decision_function(&features)?;
        Ok(Prediction {
            sentiment: Sentiment::from_class(u8::from(decision > 0.0)),
            probability: self.classifier.predict_proba(&features)?,
        })
    }

    /// Feature dimension shared by the vectorizer and classifier.
    pub fn n_features(&self) -> usize {
        self.vectorizer.dim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorizer::VectorizerConfig;

    fn service() -> SentimentService {
        let normalizer = Normalizer::new();
        let docs = ["wonder film", "terribl film"];
        let vectorizer = TfidfVectorizer::fit(VectorizerConfig::default(), &docs).unwrap();
        let mut weights = vec![0.0; vectorizer.dim()];
        weights[vectorizer.term_index("wonder").unwrap()] = 2.0;
        weights[vectorizer.term_index("terribl").unwrap()] = -2.0;
        let classifier = LogisticRegression::from_parameters(weights, 0.0);
        SentimentService::from_parts(normalizer, vectorizer, classifier).unwrap()
    }

    #[test]
    fn classifies_through_the_normalizer() {
        let service = service();
        let positive = service.predict("A <b>WONDERFUL</b> film!").unwrap();
        assert_eq!(positive.sentiment, Sentiment::Positive);
        assert!(positive.probability > 0.5);
        let negative = service.predict("Terrible.").unwrap();
        assert_eq!(negative.sentiment, Sentiment::Negative);
        assert!(negative.probability < 0.5);
    }

    #[test]
    fn rejects_blank_reviews() {
        let service = service();
        for review in ["", "   ", "\n\t"] {
            assert!(matches!(
                service.predict(review),
                Err(SentimentError::EmptyReview)
            ));
        }
    }

    #[test]
    fn out_of_vocabulary_review_falls_back_to_the_intercept() {
        let service = service();
        let prediction = service.predict("<p>!!!</p>").unwrap();
        assert_eq!(prediction.sentiment, Sentiment::Negative);
        assert_eq!(prediction.probability, 0.5);
    }

    #[test]
    fn refuses_mismatched_parts() {
        let vectorizer =
            TfidfVectorizer::fit(VectorizerConfig::default(), &["good film"]).unwrap();
        let classifier = LogisticRegression::from_parameters(vec![0.0; 1], 0.0);
        assert!(matches!(
            SentimentService::from_parts(Normalizer::new(), vectorizer, classifier),
            Err(SentimentError::DimensionMismatch { .. })
        ));
    }
}
