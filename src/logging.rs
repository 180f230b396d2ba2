//! Process-wide tracing setup shared by the binaries.

use crate::error::{Result, SentimentError};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// `DEBUG` when verbose, `INFO` otherwise.
pub fn level(verbose: bool) -> Level {
    if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    }
}

/// Installs the global fmt subscriber. Fails if one is already set.
pub fn init(verbose: bool) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level(verbose))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| SentimentError::Logging(err.to_string()))
}
