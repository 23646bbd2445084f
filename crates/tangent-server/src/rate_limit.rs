use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use std::time::Duration;
use tangent_core::rate_limit::{client_id, Decision, RateLimiter};
use tokio_util::sync::CancellationToken;

/// Only the chat API is rate limited.
const LIMITED_PATH_PREFIX: &str = "/api/chat";

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !request.uri().path().starts_with(LIMITED_PATH_PREFIX) {
        return next.run(request).await;
    }

    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok());
    let client = client_id(forwarded);

    match state.limiter.check(&client) {
        Decision::Admitted => next.run(request).await,
        Decision::Rejected { retry_after_secs } => {
            tracing::warn!(client = %client, retry_after_secs, "rate limit exceeded");
            ApiError::TooManyRequests {
                message: format!("Rate limit exceeded. Try again in {retry_after_secs} seconds."),
                retry_after_secs,
            }
            .into_response()
        }
    }
}

/// Periodic sweep of expired rate-limit windows. The task is owned by the
/// server and stops when `cancel` fires at shutdown; while the map is
/// empty each tick is a no-op.
pub fn spawn_sweeper(
    limiter: Arc<RateLimiter>,
    interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if limiter.is_empty() {
                        continue;
                    }
                    let removed = limiter.sweep();
                    if removed > 0 {
                        tracing::debug!(
                            removed,
                            remaining = limiter.len(),
                            "swept expired rate-limit windows"
                        );
                    }
                }
            }
        }
    })
}
