//! HTTP server hosting the feature toggles module

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use feature_toggles::{Config, FeatureTogglesModule};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "feature-toggles-server", version, about = "Feature toggles HTTP server")]
struct Args {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long, default_value = "127.0.0.1:8087")]
    bind: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Log feature audit and notification events
    #[arg(long)]
    audit_events: bool,
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    let mut config = Config::load(args.config.as_deref())?;
    config.audit_events |= args.audit_events;
    let module = Arc::new(FeatureTogglesModule::default());
    module
        .init(config)
        .await
        .context("failed to initialize feature toggles module")?;

    let app = module
        .register_rest(Router::new())?
        .layer(TraceLayer::new_for_http());

    let cancel = CancellationToken::new();
    let lifecycle = tokio::spawn(module.clone().serve(cancel.clone()));

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    tracing::info!(addr = %args.bind, "Feature toggles server listening");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await
        .context("server error")?;

    cancel.cancel();
    lifecycle.await.context("module task panicked")??;
    Ok(())
}
