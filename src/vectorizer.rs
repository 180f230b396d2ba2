//! TF-IDF vectorizer over normalized review text.
//!
//! Mirrors scikit-learn's `TfidfVectorizer` defaults so a model trained here
//! behaves like one trained with the Python tooling:
//!
//! - tokens match `\b\w\w+\b` (single characters are ignored)
//! - n-grams are joined with a single space
//! - the vocabulary keeps the `max_features` most frequent terms by corpus
//!   count, then indexes them in lexicographic order
//! - `idf = ln((1 + n) / (1 + df)) + 1`
//! - rows are L2-normalized

use crate::error::{Result, SentimentError};
use crc32fast::Hasher as Crc32;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

const TOKEN_PATTERN: &str = r"\b\w\w+\b";

/// Vectorizer tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Cap on vocabulary size (0 keeps every term).
    pub max_features: usize,
    /// Inclusive n-gram range.
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_features: 5000,
            ngram_range: (1, 2),
        }
    }
}

impl VectorizerConfig {
    fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || max_n < min_n {
            return Err(SentimentError::Config(format!(
                "invalid ngram range ({min_n}, {max_n})"
            )));
        }
        Ok(())
    }
}

/// Sparse view of a fixed-length feature vector.
///
/// `indices` are strictly ascending and each is `< dim`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl FeatureVector {
    /// Builds a vector from `(index, value)` pairs in any order.
    ///
    /// Repeated indices are summed; an index `>= dim` is rejected.
    pub fn from_pairs(dim: usize, mut pairs: Vec<(u32, f64)>) -> Result<Self> {
        if let Some(&(index, _)) = pairs.iter().find(|(idx, _)| *idx as usize >= dim) {
            return Err(SentimentError::FeatureIndexOutOfRange {
                index: index as usize,
                dim,
            });
        }
        pairs.sort_unstable_by_key(|(idx, _)| *idx);
        pairs.dedup_by(|next, kept| {
            if next.0 == kept.0 {
                kept.1 += next.1;
                true
            } else {
                false
            }
        });
        Ok(Self::from_sorted(dim, pairs))
    }

    fn from_sorted(dim: usize, pairs: Vec<(u32, f64)>) -> Self {
        let (indices, values) = pairs.into_iter().unzip();
        Self {
            dim,
            indices,
            values,
        }
    }

    /// Length of the dense vector.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// True when every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0.0)
    }

    /// Iterates over non-zero `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices
            .iter()
            .zip(self.values.iter())
            .map(|(&idx, &value)| (idx as usize, value))
    }

    /// Dot product with a dense vector of length `dim`.
    #[inline]
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.iter().map(|(idx, value)| dense[idx] * value).sum()
    }

    /// Materializes the dense vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dim];
        for (idx, value) in self.iter() {
            dense[idx] = value;
        }
        dense
    }
}

/// Fitted TF-IDF vectorizer. Immutable after `fit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VectorizerState", into = "VectorizerState")]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
    index: FxHashMap<String, u32>,
    tokens: Regex,
}

/// On-disk shape; the term index and regex are rebuilt on load.
#[derive(Serialize, Deserialize)]
struct VectorizerState {
    config: VectorizerConfig,
    terms: Vec<String>,
    idf: Vec<f64>,
}

impl TryFrom<VectorizerState> for TfidfVectorizer {
    type Error = String;

    fn try_from(state: VectorizerState) -> std::result::Result<Self, Self::Error> {
        if state.terms.len() != state.idf.len() {
            return Err(format!(
                "vocabulary has {} terms but {} idf weights",
                state.terms.len(),
                state.idf.len()
            ));
        }
        if state.terms.len() > u32::MAX as usize {
            return Err("vocabulary too large".to_string());
        }
        Ok(Self::from_parts(state.config, state.terms, state.idf))
    }
}

impl From<TfidfVectorizer> for VectorizerState {
    fn from(vectorizer: TfidfVectorizer) -> Self {
        Self {
            config: vectorizer.config,
            terms: vectorizer.terms,
            idf: vectorizer.idf,
        }
    }
}

#[derive(Default)]
struct TermStats {
    count: u64,
    docs: u64,
}

impl TfidfVectorizer {
    fn from_parts(config: VectorizerConfig, terms: Vec<String>, idf: Vec<f64>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx as u32))
            .collect();
        Self {
            config,
            terms,
            idf,
            index,
            tokens: token_regex(),
        }
    }

    /// Learns the vocabulary and idf weights from a normalized corpus.
    pub fn fit<S: AsRef<str>>(config: VectorizerConfig, documents: &[S]) -> Result<Self> {
        config.validate()?;
        if documents.is_empty() {
            return Err(SentimentError::EmptyDataset);
        }

        let tokens = token_regex();
        let mut stats: FxHashMap<String, TermStats> = FxHashMap::default();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for doc in documents {
            seen.clear();
            for_each_ngram(&tokens, config.ngram_range, doc.as_ref(), |term| {
                let entry = stats.entry(term.to_string()).or_default();
                entry.count += 1;
                if seen.insert(term.to_string()) {
                    entry.docs += 1;
                }
            });
        }
        if stats.is_empty() {
            return Err(SentimentError::EmptyVocabulary);
        }

        let mut ranked: Vec<(String, TermStats)> = stats.into_iter().collect();
        if config.max_features > 0 && ranked.len() > config.max_features {
            ranked.sort_unstable_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));
            ranked.truncate(config.max_features);
        }
        ranked.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let n_docs = documents.len() as f64;
        let idf = ranked
            .iter()
            .map(|(_, stat)| ((1.0 + n_docs) / (1.0 + stat.docs as f64)).ln() + 1.0)
            .collect();
        let terms = ranked.into_iter().map(|(term, _)| term).collect();
        Ok(Self::from_parts(config, terms, idf))
    }

    /// Transforms one normalized document into an L2-normalized TF-IDF vector.
    pub fn transform(&self, document: &str) -> FeatureVector {
        let mut counts: FxHashMap<u32, f64> = FxHashMap::default();
        for_each_ngram(&self.tokens, self.config.ngram_range, document, |term| {
            if let Some(&idx) = self.index.get(term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        });

        let mut pairs: Vec<(u32, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count * self.idf[idx as usize]))
            .collect();
        let norm = pairs.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in pairs.iter_mut() {
                *value /= norm;
            }
        }
        pairs.sort_unstable_by_key(|(idx, _)| *idx);
        FeatureVector::from_sorted(self.dim(), pairs)
    }

    /// Feature dimension (vocabulary size).
    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    /// Configuration used at fit time.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Vocabulary terms in feature-index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Feature index of a term, if it is in the vocabulary.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.index.get(term).map(|&idx| idx as usize)
    }

    /// Learned idf weights in feature-index order.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Checksum over configuration, vocabulary and idf weights.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = Crc32::new();
        hasher.update(&(self.config.ngram_range.0 as u64).to_le_bytes());
        hasher.update(&(self.config.ngram_range.1 as u64).to_le_bytes());
        for (term, idf) in self.terms.iter().zip(self.idf.iter()) {
            hasher.update(term.as_bytes());
            hasher.update(b"\0");
            hasher.update(&idf.to_bits().to_le_bytes());
        }
        hasher.finalize()
    }
}

fn token_regex() -> Regex {
    Regex::new(TOKEN_PATTERN).expect("token pattern")
}

fn for_each_ngram<F>(tokens: &Regex, (min_n, max_n): (usize, usize), text: &str, mut visit: F)
where
    F: FnMut(&str),
{
    let words: Vec<&str> = tokens.find_iter(text).map(|m| m.as_str()).collect();
    let mut buf = String::new();
    for n in min_n..=max_n.min(words.len()) {
        for window in words.windows(n) {
            buf.clear();
            for (i, word) in window.iter().enumerate() {
                if i > 0 {
                    buf.push(' ');
                }
                buf.push_str(word);
            }
            visit(&buf);
        }
    }
}
