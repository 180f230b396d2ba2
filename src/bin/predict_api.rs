use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use sentiment_api::{cors_layer, router, SentimentService};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "sentiment-predict-api",
    about = "HTTP API that classifies movie reviews as Positive or Negative"
)]
struct ApiCli {
    /// Address to bind the HTTP server to (host:port).
    #[arg(long, env = "SENTIMENT_BIND", default_value = "127.0.0.1:5000")]
    bind: String,

    /// Directory holding vectorizer.bin and sentiment_model.bin.
    #[arg(long, env = "SENTIMENT_ARTIFACTS_DIR", default_value = ".")]
    artifacts_dir: PathBuf,

    /// Comma-separated CORS origins; `*` allows any origin.
    #[arg(
        long,
        env = "SENTIMENT_ALLOWED_ORIGINS",
        default_value = "*",
        value_delimiter = ','
    )]
    allowed_origins: Vec<String>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ApiCli::parse();
    sentiment_api::logging::init(cli.verbose)?;

    let service = SentimentService::load(&cli.artifacts_dir).with_context(|| {
        format!(
            "failed to load sentiment artifacts from {}",
            cli.artifacts_dir.display()
        )
    })?;
    let cors = cors_layer(&cli.allowed_origins).context("invalid --allowed-origins")?;
    let app = router(Arc::new(service), cors);

    let addr: SocketAddr = cli
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", cli.bind))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        origins = %cli.allowed_origins.join(","),
        "sentiment api listening on http://{addr}"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    info!("sentiment api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
