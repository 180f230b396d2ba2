use std::borrow::Cow;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use sentiment_api::dataset::{self, ClassCounts};
use sentiment_api::{
    LogisticRegressionConfig, Normalizer, TrainingConfig, TrainingPipeline, VectorizerConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-trainer",
    about = "Fit the TF-IDF vectorizer and logistic regression on a labeled review dataset"
)]
struct TrainCli {
    /// Labeled dataset (.csv with review/sentiment columns, or .jsonl).
    #[arg(long, env = "SENTIMENT_DATASET", default_value = "IMDB Dataset.csv")]
    dataset: PathBuf,

    /// Directory the artifact pair is written to.
    #[arg(long, env = "SENTIMENT_ARTIFACTS_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Vocabulary cap (0 keeps every term).
    #[arg(long, env = "SENTIMENT_MAX_FEATURES", default_value_t = 5000)]
    max_features: usize,

    /// Smallest n-gram length.
    #[arg(long, env = "SENTIMENT_NGRAM_MIN", default_value_t = 1)]
    ngram_min: usize,

    /// Largest n-gram length.
    #[arg(long, env = "SENTIMENT_NGRAM_MAX", default_value_t = 2)]
    ngram_max: usize,

    /// Inverse regularization strength.
    #[arg(long = "c", env = "SENTIMENT_C", default_value_t = 1.0)]
    c: f64,

    /// Solver iteration cap.
    #[arg(long, env = "SENTIMENT_MAX_ITER", default_value_t = 1000)]
    max_iter: usize,

    /// Solver gradient tolerance.
    #[arg(long, env = "SENTIMENT_TOL", default_value_t = 1e-4)]
    tol: f64,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl TrainCli {
    fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            vectorizer: VectorizerConfig {
                max_features: self.max_features,
                ngram_range: (self.ngram_min, self.ngram_max),
            },
            classifier: LogisticRegressionConfig {
                c: self.c,
                max_iter: self.max_iter,
                tol: self.tol,
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = TrainCli::parse();
    sentiment_api::logging::init(cli.verbose)?;
    let started = Instant::now();

    let spinner_style = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?;

    let rows = spin(
        spinner(&spinner_style),
        format!("Loading {}...", cli.dataset.display()),
        || dataset::load(&cli.dataset),
    )
    .with_context(|| format!("failed to load dataset {}", cli.dataset.display()))?;
    let counts = ClassCounts::of(&rows);
    println!(
        "✓ Loaded {} reviews ({} positive, {} negative)",
        rows.len(),
        counts.positive,
        counts.negative
    );

    let pipeline = TrainingPipeline::new(Normalizer::new(), cli.training_config());
    let (report, paths) = spin(
        spinner(&spinner_style),
        "Normalizing, vectorizing and fitting...",
        || pipeline.fit_and_save(&rows, &cli.out_dir),
    )
    .context("training failed")?;

    println!(
        "✓ Vocabulary: {} features, solver: {} iterations ({})",
        report.vocabulary_size,
        report.iterations,
        if report.converged {
            "converged"
        } else {
            "not converged"
        }
    );
    println!(
        "✓ Training accuracy: {:.2}%",
        report.training_accuracy * 100.0
    );
    println!("✓ Wrote {}", paths.vectorizer.display());
    println!("✓ Wrote {}", paths.model.display());
    println!("Done in {}", HumanDuration(started.elapsed()));
    Ok(())
}

fn spinner(style: &ProgressStyle) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(style.clone());
    pb
}

/// Runs `step` under a ticking spinner; the spinner is cleared whatever the outcome.
fn spin<T>(pb: ProgressBar, message: impl Into<Cow<'static, str>>, step: impl FnOnce() -> T) -> T {
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    let outcome = step();
    pb.finish_and_clear();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_is_cleared_when_the_step_fails() {
        let pb = ProgressBar::hidden();
        let outcome: std::result::Result<(), &str> = spin(pb.clone(), "loading", || Err("missing"));
        assert_eq!(outcome, Err("missing"));
        assert!(pb.is_finished());
    }

    #[test]
    fn cli_flags_map_onto_training_config() {
        let cli = TrainCli::parse_from([
            "sentiment-trainer",
            "--max-features",
            "100",
            "--ngram-max",
            "1",
            "--c",
            "0.5",
        ]);
        let config = cli.training_config();
        assert_eq!(config.vectorizer.max_features, 100);
        assert_eq!(config.vectorizer.ngram_range, (1, 1));
        assert_eq!(config.classifier.c, 0.5);
        assert_eq!(config.classifier.max_iter, 1000);
    }
}
