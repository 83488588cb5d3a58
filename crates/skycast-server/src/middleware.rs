use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Client map size above which expired windows are swept.
const SWEEP_THRESHOLD: usize = 1024;

static RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
static RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter keyed by client address.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, RateLimitWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RateLimitedBody {
    error: &'static str,
    retry_after: String,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing a fixed request-per-window limit for each client.
///
/// Rejected requests get `429` with a `Retry-After` header equal to the
/// full window length.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let key = client_key(&req);
    let mut clients = rate_limit.clients.lock().await;

    if clients.len() > SWEEP_THRESHOLD {
        clients.retain(|_, w| w.started_at.elapsed() < rate_limit.window);
    }

    let window = clients.entry(key).or_insert_with(|| RateLimitWindow {
        started_at: Instant::now(),
        count: 0,
    });

    if window.started_at.elapsed() >= rate_limit.window {
        window.started_at = Instant::now();
        window.count = 0;
    }

    if window.count >= rate_limit.max_requests {
        drop(clients);
        let retry_after_secs =
            rate_limit.window.as_secs() + u64::from(rate_limit.window.subsec_nanos() > 0);
        tracing::warn!(retry_after_secs, "rate limit exceeded");
        let mut res = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(RateLimitedBody {
                error: "Too many requests. Please try again later.",
                retry_after: format!("{retry_after_secs} seconds"),
            }),
        )
            .into_response();
        let headers = res.headers_mut();
        headers.insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
        set_limit_headers(headers, rate_limit.max_requests, 0);
        return res;
    }

    window.count += 1;
    let remaining = rate_limit.max_requests - window.count;
    drop(clients);

    let mut res = next.run(req).await;
    set_limit_headers(res.headers_mut(), rate_limit.max_requests, remaining);
    res
}

fn set_limit_headers(headers: &mut HeaderMap, limit: usize, remaining: usize) {
    headers.insert(RATE_LIMIT_LIMIT.clone(), HeaderValue::from(limit));
    headers.insert(RATE_LIMIT_REMAINING.clone(), HeaderValue::from(remaining));
}

/// Identifies the caller for rate limiting.
///
/// One reverse proxy is trusted: the last `X-Forwarded-For` hop wins, then
/// the socket peer address.
fn client_key(req: &Request) -> String {
    forwarded_client(req.headers().get("x-forwarded-for"))
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn forwarded_client(value: Option<&HeaderValue>) -> Option<String> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.rsplit(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwarded_client_takes_last_hop() {
        let header = HeaderValue::from_static("203.0.113.9, 10.0.0.2");
        assert_eq!(forwarded_client(Some(&header)).as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn forwarded_client_single_hop() {
        let header = HeaderValue::from_static("198.51.100.4");
        assert_eq!(
            forwarded_client(Some(&header)).as_deref(),
            Some("198.51.100.4")
        );
    }

    #[test]
    fn forwarded_client_rejects_blank_header() {
        let header = HeaderValue::from_static("  ");
        assert_eq!(forwarded_client(Some(&header)), None);
        assert_eq!(forwarded_client(None), None);
    }

    #[test]
    fn client_key_falls_back_to_peer_address() {
        let mut req = Request::new(axum::body::Body::empty());
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4000))));
        assert_eq!(client_key(&req), "192.0.2.1");
    }

    #[test]
    fn client_key_without_any_source_is_unknown() {
        let req = Request::new(axum::body::Body::empty());
        assert_eq!(client_key(&req), "unknown");
    }
}
