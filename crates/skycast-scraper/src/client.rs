use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;

use crate::error::ScraperError;

/// Characters left unescaped by `encodeURIComponent`.
const CITY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// HTTP client for the upstream weather page.
///
/// The page URL is `prefix + encoded city + suffix`, with both halves taken
/// from configuration. A single attempt is made per call; 404 and timeouts
/// are surfaced as their own error variants so callers can report them
/// distinctly.
pub struct WeatherClient {
    client: Client,
    url_prefix: String,
    url_suffix: String,
}

impl WeatherClient {
    /// Creates a `WeatherClient` with configured timeout and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        url_prefix: impl Into<String>,
        url_suffix: impl Into<String>,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url_prefix: url_prefix.into(),
            url_suffix: url_suffix.into(),
        })
    }

    /// Builds the upstream page URL for `city`.
    #[must_use]
    pub fn page_url(&self, city: &str) -> String {
        format!(
            "{}{}{}",
            self.url_prefix,
            utf8_percent_encode(city, CITY_ENCODE_SET),
            self.url_suffix
        )
    }

    /// Fetches the raw weather page markup for `city`.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Timeout`] — the request or body read exceeded the timeout.
    /// - [`ScraperError::CityNotFound`] — upstream answered HTTP 404.
    /// - [`ScraperError::UnexpectedStatus`] — any other non-2xx status.
    /// - [`ScraperError::Http`] — network or TLS failure.
    pub async fn fetch_page(&self, city: &str) -> Result<String, ScraperError> {
        let url = self.page_url(city);
        tracing::debug!(city, "fetching upstream weather page");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| classify_transport_error(e, &url))?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ScraperError::CityNotFound { url });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        response
            .text()
            .await
            .map_err(|e| classify_transport_error(e, &url))
    }
}

fn classify_transport_error(err: reqwest::Error, url: &str) -> ScraperError {
    if err.is_timeout() {
        ScraperError::Timeout {
            url: url.to_owned(),
        }
    } else {
        ScraperError::Http(err)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
