//! Review text normalization shared by training and inference.
//!
//! Both sides must run exactly this pipeline: the vectorizer vocabulary is
//! built over its output, so any drift silently degrades predictions.

use crate::stemmer::{PorterStemmer, STEMMER_ID};
use crate::stopwords::{StopwordFilter, ENGLISH};
use crc32fast::Hasher as Crc32;
use regex::Regex;

const TAG_PATTERN: &str = r"<.*?>";
// Word characters are letters, digits and `_`; combining marks, connector
// punctuation and joiners are stripped. `\x1C`-`\x1F` count as whitespace.
const PUNCTUATION_PATTERN: &str = r"[^\p{L}\p{N}_\s\x1C-\x1F]";

#[derive(Debug, Clone)]
struct Patterns {
    tags: Regex,
    punctuation: Regex,
}

impl Patterns {
    fn new() -> Self {
        Self {
            tags: Regex::new(TAG_PATTERN).expect("tag pattern"),
            punctuation: Regex::new(PUNCTUATION_PATTERN).expect("punctuation pattern"),
        }
    }
}

/// Stateless review normalizer: lowercase, strip markup and punctuation,
/// drop stopwords (keeping `not`), Porter-stem, rejoin.
#[derive(Debug, Clone)]
pub struct Normalizer {
    patterns: Patterns,
    stopwords: StopwordFilter,
    stemmer: PorterStemmer,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    /// Builds a normalizer with the pinned stopword list and stemmer.
    pub fn new() -> Self {
        Self {
            patterns: Patterns::new(),
            stopwords: StopwordFilter::english(),
            stemmer: PorterStemmer::new(),
        }
    }

    /// Normalizes a review into a space-joined string of stemmed tokens.
    ///
    /// Empty or markup-only input yields an empty string.
    pub fn normalize(&self, text: &str) -> String {
        let cleaned = self.clean(text);
        let mut out = String::with_capacity(cleaned.len());
        for token in cleaned.split(is_separator).filter(|t| !t.is_empty()) {
            if self.stopwords.should_drop(token) {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&self.stemmer.stem(token));
        }
        out
    }

    /// Lowercases and strips tags and punctuation, leaving whitespace intact.
    pub fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let untagged = self.patterns.tags.replace_all(&lowered, "");
        self.patterns
            .punctuation
            .replace_all(&untagged, "")
            .into_owned()
    }

    /// Checksum identifying this exact normalization pipeline.
    ///
    /// Stored in the vectorizer artifact and compared at load time.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = Crc32::new();
        hasher.update(TAG_PATTERN.as_bytes());
        hasher.update(b"\0");
        hasher.update(PUNCTUATION_PATTERN.as_bytes());
        hasher.update(b"\0");
        for word in ENGLISH {
            hasher.update(word.as_bytes());
            hasher.update(b"\n");
        }
        hasher.update(STEMMER_ID.as_bytes());
        hasher.finalize()
    }
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&ch)
}
