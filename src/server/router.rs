use crate::cid::Cid;
use crate::db::Timestamper;
use crate::error::{ApiErrorBody, ApiErrorObject};
use crate::server::routes::{admin, health};

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{HeaderName, HeaderValue, StatusCode, Version},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const MAX_REQUEST_ID_LEN: usize = 128;
const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn format_http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "HTTP/0.9",
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2",
        Version::HTTP_3 => "HTTP/3",
        _ => "HTTP/?",
    }
}

#[derive(Clone)]
pub struct AppState {
    pub timestamper: Arc<dyn Timestamper>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(timestamper: Arc<dyn Timestamper>, request_timeout: Duration) -> Self {
        Self {
            timestamper,
            request_timeout,
        }
    }
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

fn timeout_response() -> Response {
    let body = ApiErrorBody {
        inner: ApiErrorObject {
            code: "REQUEST_TIMEOUT".to_string(),
            message: "The request did not complete in time.".to_string(),
            details: None,
        },
    };
    (StatusCode::REQUEST_TIMEOUT, Json(body)).into_response()
}

/// Assigns the correlation id, enforces the request deadline and writes one
/// access log line per request.
async fn access_log(
    State(deadline): State<Duration>,
    mut req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let version = req.version();

    let cid = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN)
        .map(Cid::from)
        .unwrap_or_else(Cid::generate);
    req.extensions_mut().insert(cid.clone());

    let start = Instant::now();
    // Dropping the handler future on expiry cancels any in-flight statement.
    let mut resp = match tokio::time::timeout(deadline, next.run(req)).await {
        Ok(resp) => resp,
        Err(_) => timeout_response(),
    };

    if let Ok(value) = HeaderValue::from_str(cid.as_str()) {
        resp.headers_mut().insert(X_REQUEST_ID, value);
    }

    let status = resp.status();
    let latency_ms = start.elapsed().as_millis() as u64;
    let path = uri.path();
    let protocol = format_http_version(version);

    if status.is_server_error() {
        error!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms",
            status.as_u16(),
            cid,
            method.as_str(),
            protocol,
            path,
            latency_ms,
        );
    } else if status.is_client_error() {
        warn!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms",
            status.as_u16(),
            cid,
            method.as_str(),
            protocol,
            path,
            latency_ms,
        );
    } else {
        info!(
            "| {:>3} | {} | {:^7} | {:<8} | {} | {}ms",
            status.as_u16(),
            cid,
            method.as_str(),
            protocol,
            path,
            latency_ms,
        );
    }

    resp
}

pub fn app_router(state: AppState) -> Router {
    let deadline = state.request_timeout;

    Router::new()
        .route("/hc", get(health::hc))
        .route("/ts/{table}/{id}", patch(admin::patch_timestamps))
        .route("/undel/{table}/{id}", patch(admin::undelete))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(middleware::from_fn_with_state(deadline, access_log))
}
