//! Binary sentiment label.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifier output mapped to a human-readable label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    /// Class `1`.
    Positive,
    /// Class `0`.
    Negative,
}

impl Sentiment {
    /// Maps a classifier class to a label; anything but `1` is negative.
    pub fn from_class(class: u8) -> Self {
        if class == 1 {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    /// Numeric class used for training.
    pub fn class(self) -> u8 {
        match self {
            Self::Positive => 1,
            Self::Negative => 0,
        }
    }

    /// Parses a dataset label (`positive`/`negative`, or `1`/`0`).
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" | "1" => Some(Self::Positive),
            "negative" | "0" => Some(Self::Negative),
            _ => None,
        }
    }

    /// Display form used in API responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dataset_labels() {
        assert_eq!(Sentiment::from_label("positive"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label(" Negative\r"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::from_label("1"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::from_label("neutral"), None);
    }

    #[test]
    fn class_mapping_round_trips() {
        for label in [Sentiment::Positive, Sentiment::Negative] {
            assert_eq!(Sentiment::from_class(label.class()), label);
        }
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"Positive\""
        );
    }
}
