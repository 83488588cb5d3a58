mod weather;

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use skycast_core::SelectorConfig;
use skycast_scraper::WeatherClient;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState};

const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; script-src 'self'; style-src 'self';";

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<WeatherClient>,
    pub selectors: Arc<SelectorConfig>,
}

/// Error body returned by every failing weather request.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: &'static str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
}

impl ApiError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code,
        }
    }

    fn status(&self) -> StatusCode {
        match self.code {
            "INVALID_CITY" => StatusCode::BAD_REQUEST,
            "DATA_NOT_FOUND" | "CITY_NOT_FOUND" => StatusCode::NOT_FOUND,
            "TIMEOUT" => StatusCode::GATEWAY_TIMEOUT,
            "SERVICE_UNAVAILABLE" | "PARSE_ERROR" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

fn weather_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/weather/{city}", get(weather::get_weather))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/health", get(health));

    with_common_layers(
        Router::new()
            .merge(public_routes)
            .merge(weather_router(rate_limit)),
    )
    .with_state(state)
}

/// Outer middleware shared by every route. Panics are caught innermost so
/// the resulting 500 still carries the request id and CSP headers.
fn with_common_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(build_cors())
            .layer(SetResponseHeaderLayer::overriding(
                header::CONTENT_SECURITY_POLICY,
                HeaderValue::from_static(CONTENT_SECURITY_POLICY),
            ))
            .layer(axum::middleware::from_fn(request_id))
            .layer(CatchPanicLayer::custom(panic_response)),
    )
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> axum::response::Response {
    let detail = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload");
    tracing::error!(panic = detail, "handler panicked");
    ApiError::new(
        "SERVER_ERROR",
        "Unexpected server error. Please try again later.",
    )
    .into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthData { status: "ok" }))
}

pub fn rate_limit_state(max_requests: usize, window_secs: u64) -> RateLimitState {
    RateLimitState::new(max_requests, Duration::from_secs(window_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"<html><body>
      <span class="date">Mon 20 Oct</span>
      <span class="temp">9°</span>
      <span class="minmax">Low 4° High 11°</span>
      <span class="hp">101300.81%</span>
      <span class="cond">Drizzle</span>
    </body></html>"#;

    fn selectors() -> SelectorConfig {
        SelectorConfig {
            temperature: ".temp".to_owned(),
            min_max_temperature: ".minmax".to_owned(),
            humidity_pressure: ".hp".to_owned(),
            condition: ".cond".to_owned(),
            date: ".date".to_owned(),
        }
    }

    fn app_for(server_uri: &str, rate_limit: RateLimitState) -> Router {
        let client = WeatherClient::new(format!("{server_uri}/w/"), "", 2, "skycast-test/0.1")
            .expect("client");
        build_app(
            AppState {
                client: Arc::new(client),
                selectors: Arc::new(selectors()),
            },
            rate_limit,
        )
    }

    fn app(server_uri: &str) -> Router {
        app_for(server_uri, rate_limit_state(100, 900))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    async fn upstream_returning(template: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(template)
            .mount(&server)
            .await;
        server
    }

    #[test]
    fn api_error_codes_map_to_statuses() {
        let cases = [
            ("INVALID_CITY", StatusCode::BAD_REQUEST),
            ("DATA_NOT_FOUND", StatusCode::NOT_FOUND),
            ("CITY_NOT_FOUND", StatusCode::NOT_FOUND),
            ("TIMEOUT", StatusCode::GATEWAY_TIMEOUT),
            ("SERVICE_UNAVAILABLE", StatusCode::SERVICE_UNAVAILABLE),
            ("PARSE_ERROR", StatusCode::SERVICE_UNAVAILABLE),
            ("SERVER_ERROR", StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (code, status) in cases {
            let response = ApiError::new(code, "message").into_response();
            assert_eq!(response.status(), status, "code {code}");
        }
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = app("http://127.0.0.1:9")
            .oneshot(get_request("/api/health"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn weather_returns_record_for_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/New%20York"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server.uri())
            .oneshot(get_request("/api/weather/New%20York"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["date"], "Mon 20 Oct");
        assert_eq!(json["temperature"], "9°");
        assert_eq!(json["condition"], "Drizzle");
        assert_eq!(json["minTemperature"], "4°");
        assert_eq!(json["maxTemperature"], "11°");
        assert_eq!(json["humidity"], "81%");
        assert_eq!(json["pressure"], "1013.00");
    }

    #[tokio::test]
    async fn weather_sets_security_and_request_id_headers() {
        let server = upstream_returning(ResponseTemplate::new(200).set_body_string(PAGE)).await;
        let request = Request::builder()
            .uri("/api/weather/Paris")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .expect("request");

        let response = app(&server.uri()).oneshot(request).await.expect("response");

        let headers = response.headers();
        assert_eq!(headers["x-request-id"], "req-123");
        assert_eq!(headers["content-security-policy"], CONTENT_SECURITY_POLICY);
        assert_eq!(headers["x-ratelimit-limit"], "100");
        assert_eq!(headers["x-ratelimit-remaining"], "99");
    }

    #[tokio::test]
    async fn weather_rejects_invalid_city() {
        for uri in ["/api/weather/x", "/api/weather/Paris1", "/api/weather/%3Cscript%3E"] {
            let response = app("http://127.0.0.1:9")
                .oneshot(get_request(uri))
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "uri {uri}");
            assert_eq!(json_body(response).await["code"], "INVALID_CITY");
        }
    }

    #[tokio::test]
    async fn weather_missing_required_field_is_404_data_not_found() {
        let server = upstream_returning(
            ResponseTemplate::new(200).set_body_string(r#"<span class="cond">Clear</span>"#),
        )
        .await;

        let response = app(&server.uri())
            .oneshot(get_request("/api/weather/Lima"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["code"], "DATA_NOT_FOUND");
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn weather_upstream_404_is_city_not_found() {
        let server = upstream_returning(ResponseTemplate::new(404)).await;

        let response = app(&server.uri())
            .oneshot(get_request("/api/weather/Nowhere"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], "CITY_NOT_FOUND");
    }

    #[tokio::test]
    async fn weather_upstream_failure_is_503_without_details() {
        let server = upstream_returning(ResponseTemplate::new(500)).await;

        let response = app(&server.uri())
            .oneshot(get_request("/api/weather/Lima"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = json_body(response).await;
        assert_eq!(json["code"], "SERVICE_UNAVAILABLE");
        let message = json["error"].as_str().expect("message");
        assert!(!message.contains("500"));
        assert!(!message.contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn weather_is_rate_limited_per_client() {
        let app = app_for("http://127.0.0.1:9", rate_limit_state(1, 60));

        let first = app
            .clone()
            .oneshot(get_request("/api/weather/x"))
            .await
            .expect("response");
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = app
            .clone()
            .oneshot(get_request("/api/weather/x"))
            .await
            .expect("response");
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(second.headers()["retry-after"], "60");
        let json = json_body(second).await;
        assert_eq!(json["retryAfter"], "60 seconds");

        let other_client = Request::builder()
            .uri("/api/weather/x")
            .header("x-forwarded-for", "198.51.100.7")
            .body(Body::empty())
            .expect("request");
        let third = app.oneshot(other_client).await.expect("response");
        assert_eq!(third.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn handler_panic_becomes_server_error() {
        async fn explode() -> StatusCode {
            panic!("selector table corrupted");
        }

        let app = with_common_layers(Router::new().route("/api/explode", get(explode)));
        let request = Request::builder()
            .uri("/api/explode")
            .header("x-request-id", "req-panic")
            .body(Body::empty())
            .expect("request");

        let response = app.oneshot(request).await.expect("response");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()["x-request-id"], "req-panic");
        let json = json_body(response).await;
        assert_eq!(json["code"], "SERVER_ERROR");
        let message = json["error"].as_str().expect("message");
        assert!(!message.contains("selector table"));
    }

    #[tokio::test]
    async fn health_is_not_rate_limited() {
        let app = app_for("http://127.0.0.1:9", rate_limit_state(0, 60));
        let response = app
            .oneshot(get_request("/api/health"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
