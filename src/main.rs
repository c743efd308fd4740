//! Server entry point for the guarded fetch API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use downloader_api::{
    AddressChecker, AppState, Database, GuardedClient, KvBackend, KvStore, MemoryKv, NoteStore,
    RestKv, router,
};
use tracing::{debug, info, warn};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    let config = args.into_config().context("invalid configuration")?;

    let client = GuardedClient::new(AddressChecker::system())
        .context("failed to build outbound HTTP client")?;

    let kv: Arc<dyn KvStore> = match &config.kv {
        KvBackend::Rest { url, token } => {
            info!(%url, "using REST key/value backend");
            Arc::new(RestKv::new(url.clone(), token.clone()).context("failed to build kv client")?)
        }
        KvBackend::Memory => {
            warn!("no kv REST backend configured, using process memory");
            Arc::new(MemoryKv::new())
        }
    };

    let database = match &config.database {
        Some(path) => {
            let db = Database::new(path)
                .await
                .with_context(|| format!("failed to open notes database {}", path.display()))?;
            info!(path = %path.display(), "notes database ready");
            Some(db)
        }
        None => {
            info!("no database configured, notes routes disabled");
            None
        }
    };
    let notes = database.clone().map(NoteStore::new);

    if !config.api_keys.is_required() {
        warn!("no API keys configured, mutating routes are open");
    }

    let state = AppState::new(client, config.limits, kv, notes, config.api_keys.clone());
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        bind = %config.bind,
        max_bytes = config.limits.max_bytes,
        idle_timeout = ?config.limits.idle_timeout,
        "Downloader API listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(db) = database {
        db.close().await;
        debug!("notes database closed");
    }
    info!("Downloader API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
