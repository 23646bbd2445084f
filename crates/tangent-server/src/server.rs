use crate::config::Config;
use crate::rate_limit::{rate_limit_middleware, spawn_sweeper};
use crate::routes::api_routes;
use crate::store::ContentStore;
use anyhow::Context;
use axum::middleware;
use axum::Router;
use colored::Colorize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tangent_core::embeddings::{parse_embeddings, EmbeddingsData};
use tangent_core::rate_limit::RateLimiter;
use tokio_util::sync::CancellationToken;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub embeddings: Option<Arc<EmbeddingsData>>,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(
        store: Arc<ContentStore>,
        embeddings: Option<Arc<EmbeddingsData>>,
        limiter: Arc<RateLimiter>,
        config: Arc<Config>,
    ) -> AppState {
        AppState {
            store,
            embeddings,
            limiter,
            config,
            http: reqwest::Client::new(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Load the precomputed embeddings file. Both a missing file and a
/// malformed one degrade to "no similarity features" rather than failing
/// startup.
pub fn load_embeddings(path: &Path) -> Option<Arc<EmbeddingsData>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "embeddings file unavailable; similarity features disabled"
            );
            return None;
        }
    };
    match parse_embeddings(&raw) {
        Ok(data) => Some(Arc::new(data)),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to parse embeddings file");
            None
        }
    }
}

pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let store = Arc::new(ContentStore::new(&config.content.dir));
    let count = store
        .load()
        .context("failed to load content directory")?;
    tracing::info!(
        documents = count,
        dir = %config.content.dir.display(),
        "content loaded"
    );

    let embeddings = load_embeddings(&config.content.embeddings_path);
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.to_core()));

    let cancel = CancellationToken::new();
    let sweeper = spawn_sweeper(
        limiter.clone(),
        config.rate_limit.sweep_interval(),
        cancel.clone(),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("invalid listen address")?;

    let state = AppState::new(store, embeddings, limiter, Arc::new(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    println!(
        "{}",
        format!("tangent is listening on http://{local_addr}")
            .green()
            .bold()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cancel.cancel();
    sweeper.await.ok();
    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}
