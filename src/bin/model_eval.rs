use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use sentiment_api::{dataset, LabeledReview, Sentiment, SentimentService};
use serde::Serialize;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-eval",
    about = "Evaluate a trained artifact pair against a labeled review dataset"
)]
struct EvalCli {
    /// Labeled dataset (.csv or .jsonl).
    #[arg(long, env = "SENTIMENT_EVAL_DATA")]
    dataset: PathBuf,

    /// Directory holding vectorizer.bin and sentiment_model.bin.
    #[arg(long, env = "SENTIMENT_ARTIFACTS_DIR", default_value = ".")]
    artifacts_dir: PathBuf,

    /// Optional JSON report output path.
    #[arg(long, env = "SENTIMENT_EVAL_REPORT")]
    report_json: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Rows are the true label, columns the predicted one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
struct ConfusionMatrix {
    true_positive: usize,
    false_negative: usize,
    false_positive: usize,
    true_negative: usize,
}

impl ConfusionMatrix {
    fn record(&mut self, actual: Sentiment, predicted: Sentiment) {
        match (actual, predicted) {
            (Sentiment::Positive, Sentiment::Positive) => self.true_positive += 1,
            (Sentiment::Positive, Sentiment::Negative) => self.false_negative += 1,
            (Sentiment::Negative, Sentiment::Positive) => self.false_positive += 1,
            (Sentiment::Negative, Sentiment::Negative) => self.true_negative += 1,
        }
    }

    fn merge(mut self, other: Self) -> Self {
        self.true_positive += other.true_positive;
        self.false_negative += other.false_negative;
        self.false_positive += other.false_positive;
        self.true_negative += other.true_negative;
        self
    }

    fn total(&self) -> usize {
        self.true_positive + self.false_negative + self.false_positive + self.true_negative
    }

    fn summary(&self, skipped: usize, latency_ms: f64) -> EvalSummary {
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
        let precision = ratio(self.true_positive, self.true_positive + self.false_positive);
        let recall = ratio(self.true_positive, self.true_positive + self.false_negative);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        EvalSummary {
            evaluated: self.total(),
            skipped,
            accuracy: ratio(self.true_positive + self.true_negative, self.total()),
            precision,
            recall,
            f1,
            latency_ms,
            confusion: *self,
        }
    }
}

#[derive(Debug, Serialize)]
struct EvalSummary {
    evaluated: usize,
    skipped: usize,
    accuracy: f64,
    precision: f64,
    recall: f64,
    f1: f64,
    latency_ms: f64,
    confusion: ConfusionMatrix,
}

fn main() -> Result<()> {
    let cli = EvalCli::parse();
    sentiment_api::logging::init(cli.verbose)?;

    let service = SentimentService::load(&cli.artifacts_dir).with_context(|| {
        format!(
            "failed to load sentiment artifacts from {}",
            cli.artifacts_dir.display()
        )
    })?;
    let rows = dataset::load(&cli.dataset)
        .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;
    anyhow::ensure!(!rows.is_empty(), "evaluation dataset contains no rows");

    let summary = evaluate(&service, &rows)?;
    render_summary(&summary);
    if let Some(path) = cli.report_json {
        write_report(&summary, &path)?;
        info!(path = %path.display(), "wrote JSON report");
    }
    Ok(())
}

fn evaluate(service: &SentimentService, rows: &[LabeledReview]) -> Result<EvalSummary> {
    let pb = ProgressBar::new(rows.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")?
            .progress_chars("█▓▒░  "),
    );
    let start = Instant::now();
    // Blank reviews cannot be classified; they are counted but not scored.
    let (matrix, skipped) = rows
        .par_iter()
        .map(|row| {
            let outcome = match service.predict(&row.review) {
                Ok(prediction) => {
                    let mut matrix = ConfusionMatrix::default();
                    matrix.record(row.sentiment, prediction.sentiment);
                    Ok((matrix, 0))
                }
                Err(sentiment_api::SentimentError::EmptyReview) => {
                    Ok((ConfusionMatrix::default(), 1))
                }
                Err(err) => Err(err),
            };
            pb.inc(1);
            outcome
        })
        .try_reduce(
            || (ConfusionMatrix::default(), 0usize),
            |a, b| Ok((a.0.merge(b.0), a.1 + b.1)),
        )?;
    pb.finish_and_clear();
    let latency_ms = if matrix.total() == 0 {
        0.0
    } else {
        start.elapsed().as_secs_f64() * 1000.0 / matrix.total() as f64
    };
    Ok(matrix.summary(skipped, latency_ms))
}

fn render_summary(summary: &EvalSummary) {
    let m = &summary.confusion;
    println!("--- Sentiment Evaluation Summary ---");
    println!("reviews: {} (skipped {} blank)", summary.evaluated, summary.skipped);
    println!("accuracy: {:.4}", summary.accuracy);
    println!("precision: {:.4}", summary.precision);
    println!("recall: {:.4}", summary.recall);
    println!("f1: {:.4}", summary.f1);
    println!("avg latency per review (ms): {:.3}", summary.latency_ms);
    println!("confusion (rows = actual, cols = predicted):");
    println!("              Positive  Negative");
    println!("  Positive  {:>10}{:>10}", m.true_positive, m.false_negative);
    println!("  Negative  {:>10}{:>10}", m.false_positive, m.true_negative);
}

fn write_report(summary: &EvalSummary, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {:?}", path))?;
    serde_json::to_writer_pretty(file, summary).context("failed to write JSON report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_metrics_follow_the_confusion_matrix() {
        let mut matrix = ConfusionMatrix::default();
        for (actual, predicted) in [
            (Sentiment::Positive, Sentiment::Positive),
            (Sentiment::Positive, Sentiment::Positive),
            (Sentiment::Positive, Sentiment::Negative),
            (Sentiment::Negative, Sentiment::Negative),
            (Sentiment::Negative, Sentiment::Positive),
        ] {
            matrix.record(actual, predicted);
        }
        let summary = matrix.summary(1, 0.0);
        assert_eq!(summary.evaluated, 5);
        assert_eq!(summary.skipped, 1);
        assert!((summary.accuracy - 0.6).abs() < 1e-12);
        assert!((summary.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((summary.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((summary.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn merge_adds_cells() {
        let mut a = ConfusionMatrix::default();
        a.record(Sentiment::Positive, Sentiment::Positive);
        let mut b = ConfusionMatrix::default();
        b.record(Sentiment::Negative, Sentiment::Positive);
        let merged = a.merge(b);
        assert_eq!(merged.true_positive, 1);
        assert_eq!(merged.false_positive, 1);
        assert_eq!(merged.total(), 2);
    }
}
