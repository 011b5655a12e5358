//! Per-request logging middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use passport_session::cookie;
use tracing::{debug, error, warn};

use crate::state::AppState;

/// Log each request with its outcome and whether it carried or received a
/// session cookie.
///
/// Successful requests log at `debug`, rejected ones at `warn` and failed
/// ones at `error`. Disabled by `ServerConfig::request_logging`.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let had_session = cookie::read_cookie(request.headers(), &state.sessions.config().cookie_name)
        .is_some_and(|value| !value.is_empty());

    let started = Instant::now();
    let response = next.run(request).await;
    let latency_ms = started.elapsed().as_millis() as u64;

    let status = response.status();
    let code = status.as_u16();
    let cookie_issued = response.headers().contains_key(header::SET_COOKIE);

    if status.is_server_error() {
        error!(%method, %path, status = code, latency_ms, had_session, cookie_issued, "Request failed");
    } else if status.is_client_error() {
        warn!(%method, %path, status = code, latency_ms, had_session, cookie_issued, "Request rejected");
    } else {
        debug!(%method, %path, status = code, latency_ms, had_session, cookie_issued, "Request served");
    }

    response
}
