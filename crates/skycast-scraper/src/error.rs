use skycast_core::WeatherField;
use thiserror::Error;

/// Failures while fetching the upstream weather page.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("city not found upstream: {url}")]
    CityNotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid selector for {field} ({selector:?}): {reason}")]
    InvalidSelector {
        field: WeatherField,
        selector: String,
        reason: String,
    },
}

/// Outcome of looking up a single selector in a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// No element matched. Distinct from an element with empty text.
    #[error("no element matches selector {selector:?}")]
    Absent { selector: String },

    #[error("selector {selector:?} could not be parsed: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Reasons a [`skycast_core::WeatherRecord`] could not be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("required field {field} is missing or empty")]
    DataNotFound { field: WeatherField },

    #[error("selector {selector:?} could not be parsed: {reason}")]
    InvalidSelector { selector: String, reason: String },
}
