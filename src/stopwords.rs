//! Pinned English stopword list.
//!
//! The list is the 179-entry NLTK English corpus. It is embedded rather than
//! pulled from a crate so that normalization stays byte-for-byte stable for
//! every artifact trained against it.

use rustc_hash::FxHashSet;

/// Token that survives stopword filtering even though it is in the list.
pub const NEGATION: &str = "not";

/// NLTK English stopwords, in corpus order.
pub const ENGLISH: [&str; 179] = [
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Read-only stopword set with the negation exception baked in.
#[derive(Debug, Clone)]
pub struct StopwordFilter {
    words: FxHashSet<&'static str>,
}

impl Default for StopwordFilter {
    fn default() -> Self {
        Self::english()
    }
}

impl StopwordFilter {
    /// Builds the filter over the pinned English list.
    pub fn english() -> Self {
        Self {
            words: ENGLISH.iter().copied().collect(),
        }
    }

    /// True when `token` must be dropped. `not` is never dropped.
    #[inline]
    pub fn should_drop(&self, token: &str) -> bool {
        token != NEGATION && self.words.contains(token)
    }

    /// Raw membership test, ignoring the negation exception.
    #[inline]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    /// Number of entries in the list.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
