use std::sync::LazyLock;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use regex::Regex;
use skycast_core::WeatherRecord;
use skycast_scraper::{scrape_weather, ExtractionError, ScraperError};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

static CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s-]{2,50}$").expect("valid city regex"));

pub(super) async fn get_weather(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(city): Path<String>,
) -> Result<Json<WeatherRecord>, ApiError> {
    let city = validate_city(&city).ok_or_else(|| {
        ApiError::new(
            "INVALID_CITY",
            "Invalid city name. Use letters, spaces, and hyphens (2-50 chars).",
        )
    })?;

    let markup = state
        .client
        .fetch_page(city)
        .await
        .map_err(|e| map_scraper_error(&req_id, &e))?;

    let record = scrape_weather(&markup, &state.selectors)
        .map_err(|e| map_extraction_error(&req_id, &e))?;

    tracing::info!(request_id = %req_id.0, city, "weather scraped");
    Ok(Json(record))
}

/// Trims `raw` and accepts it only if it is 2-50 letters, spaces or hyphens.
fn validate_city(raw: &str) -> Option<&str> {
    let city = raw.trim();
    CITY_RE.is_match(city).then_some(city)
}

fn map_scraper_error(req_id: &RequestId, error: &ScraperError) -> ApiError {
    tracing::error!(request_id = %req_id.0, error = %error, "scraping error");
    match error {
        ScraperError::Timeout { .. } => ApiError::new(
            "TIMEOUT",
            "Request timeout. Weather service took too long.",
        ),
        ScraperError::CityNotFound { .. } => ApiError::new(
            "CITY_NOT_FOUND",
            "City not found. Please check the spelling.",
        ),
        _ => ApiError::new(
            "SERVICE_UNAVAILABLE",
            "Weather service temporarily unavailable.",
        ),
    }
}

fn map_extraction_error(req_id: &RequestId, error: &ExtractionError) -> ApiError {
    match error {
        ExtractionError::DataNotFound { field } => {
            tracing::warn!(request_id = %req_id.0, %field, "required weather field missing");
            ApiError::new(
                "DATA_NOT_FOUND",
                "Weather data not found for the specified city.",
            )
        }
        ExtractionError::InvalidSelector { .. } => {
            tracing::error!(request_id = %req_id.0, error = %error, "data parsing error");
            ApiError::new(
                "PARSE_ERROR",
                "Unable to parse weather data. The weather service might be temporarily unavailable.",
            )
        }
    }
}
