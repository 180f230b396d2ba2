#![allow(dead_code)]

use sentiment_api::{LabeledReview, Sentiment};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const POSITIVE: &[&str] = &[
    "This movie was absolutely wonderful and brilliant!",
    "A wonderful film with brilliant acting.",
    "Brilliant story, wonderful cast, I loved every minute.",
    "The acting was good and the story was great.",
    "Good movie, great fun, highly recommended.",
    "An excellent and beautiful film.<br /><br />Loved it.",
    "I loved this movie, it was good from start to finish.",
    "Great direction and a brilliant script.",
    "A beautiful, moving and wonderful experience.",
    "The performances were excellent and the music was great.",
    "Really good film, I would watch it again.",
    "Amazing visuals and a wonderful soundtrack.",
    "One of the best movies I have seen this year, brilliant.",
    "Funny, charming and good. A real delight.",
    "<p>Superb acting and an excellent plot.</p>",
    "The cast is great and the ending is perfect.",
    "Loved the characters, a truly great movie.",
    "Good writing, good acting, a good time overall.",
    "Masterpiece. Wonderful from the first scene.",
    "A delightful and brilliant comedy, highly enjoyable.",
];

const NEGATIVE: &[&str] = &[
    "This movie was terrible and boring, a complete waste of time.",
    "A boring film with terrible acting.",
    "Awful story, terrible cast, I hated every minute.",
    "The acting was not good and the story was bad.",
    "Not good at all. Boring and dull.",
    "A dull and ugly film.<br /><br />Hated it.",
    "I hated this movie, it was bad from start to finish.",
    "Poor direction and a terrible script.",
    "A pointless, tedious and awful experience.",
    "The performances were bad and the music was not good.",
    "Really bad film, a waste of money.",
    "Ugly visuals and an awful soundtrack.",
    "One of the worst movies I have seen this year, terrible.",
    "Boring, stupid and not good. A real disappointment.",
    "<p>Horrible acting and a boring plot.</p>",
    "The cast is bad and the ending is a waste.",
    "Hated the characters, a truly awful movie.",
    "Bad writing, bad acting, not good overall.",
    "Disaster. Terrible from the first scene.",
    "A tedious and boring comedy, a complete waste of time.",
];

pub fn polarized_reviews() -> Vec<LabeledReview> {
    POSITIVE
        .iter()
        .map(|review| LabeledReview::new(*review, Sentiment::Positive))
        .chain(
            NEGATIVE
                .iter()
                .map(|review| LabeledReview::new(*review, Sentiment::Negative)),
        )
        .collect()
}

pub fn write_csv(dir: &Path, rows: &[LabeledReview]) -> PathBuf {
    let mut out = String::from("review,sentiment\n");
    for row in rows {
        let label = match row.sentiment {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
        };
        writeln!(out, "\"{}\",{}", row.review.replace('"', "\"\""), label).unwrap();
    }
    let path = dir.join("reviews.csv");
    fs::write(&path, out).unwrap();
    path
}

pub fn write_jsonl(dir: &Path, rows: &[LabeledReview]) -> PathBuf {
    let mut out = String::new();
    for row in rows {
        let line = serde_json::json!({
            "review": row.review,
            "sentiment": row.sentiment.as_str().to_lowercase(),
        });
        writeln!(out, "{line}").unwrap();
    }
    let path = dir.join("reviews.jsonl");
    fs::write(&path, out).unwrap();
    path
}
