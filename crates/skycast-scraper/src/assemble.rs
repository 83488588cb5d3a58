//! Builds a [`WeatherRecord`] from a parsed page and a [`SelectorConfig`].

use std::collections::HashMap;

use skycast_core::{SelectorConfig, WeatherField, WeatherRecord};

use crate::document::{compile_selector, Document, HtmlDocument};
use crate::error::{ExtractionError, FieldError, ScraperError};
use crate::extract::extract_optional;
use crate::normalize::{normalize_pressure, split_humidity_pressure, split_min_max_temperature};

/// Extracts every configured field and assembles a [`WeatherRecord`].
///
/// Fields where [`WeatherField::is_required`] holds must resolve to
/// non-empty text; every other field degrades to `"N/A"` (or `None` for
/// `date`). The document is only read, so repeated calls with the same
/// inputs return equal records.
///
/// # Errors
///
/// - [`ExtractionError::DataNotFound`] — a required field is absent or blank.
/// - [`ExtractionError::InvalidSelector`] — a configured selector cannot be parsed.
pub fn assemble_record<D: Document>(
    document: &D,
    selectors: &SelectorConfig,
) -> Result<WeatherRecord, ExtractionError> {
    let lookup = |field: WeatherField| -> Result<Option<String>, ExtractionError> {
        extract_optional(document, selectors.selector(field)).map_err(|e| match e {
            FieldError::InvalidSelector { selector, reason } => {
                ExtractionError::InvalidSelector { selector, reason }
            }
            FieldError::Absent { .. } => ExtractionError::DataNotFound { field },
        })
    };

    let mut values = HashMap::with_capacity(WeatherField::ALL.len());
    for field in WeatherField::ALL {
        if let Some(text) = lookup(field)? {
            values.insert(field, text);
        }
    }

    for field in WeatherField::ALL {
        if values.contains_key(&field) {
            continue;
        }
        if field.is_required() {
            return Err(ExtractionError::DataNotFound { field });
        }
        tracing::debug!(%field, "optional field unavailable");
    }

    let mut take_required = |field: WeatherField| {
        values
            .remove(&field)
            .ok_or(ExtractionError::DataNotFound { field })
    };
    let temperature = take_required(WeatherField::Temperature)?;
    let condition = take_required(WeatherField::Condition)?;
    let min_max = values.remove(&WeatherField::MinMaxTemperature);
    let humidity_pressure = values.remove(&WeatherField::HumidityPressure);
    let date = values.remove(&WeatherField::Date);

    let min_max = split_min_max_temperature(min_max.as_deref());
    let split = split_humidity_pressure(humidity_pressure.as_deref());
    let pressure = normalize_pressure(&split.pressure);

    Ok(WeatherRecord {
        date,
        temperature,
        condition,
        min_temperature: min_max.min,
        max_temperature: min_max.max,
        humidity: split.humidity,
        pressure,
    })
}

/// Parses `markup` and runs [`assemble_record`] over it.
///
/// Parsing and extraction happen in one synchronous call so the parsed
/// DOM never has to cross an `.await`.
///
/// # Errors
///
/// Same as [`assemble_record`].
pub fn scrape_weather(
    markup: &str,
    selectors: &SelectorConfig,
) -> Result<WeatherRecord, ExtractionError> {
    let document = HtmlDocument::parse(markup);
    assemble_record(&document, selectors)
}

/// Checks that every configured selector is valid CSS.
///
/// Meant to run once at startup so that a bad selector fails the process
/// instead of every request.
///
/// # Errors
///
/// Returns [`ScraperError::InvalidSelector`] naming the first bad field.
pub fn validate_selectors(selectors: &SelectorConfig) -> Result<(), ScraperError> {
    for (field, selector) in selectors.iter() {
        if let Err(FieldError::InvalidSelector { selector, reason }) = compile_selector(selector)
        {
            return Err(ScraperError::InvalidSelector {
                field,
                selector,
                reason,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "assemble_test.rs"]
mod tests;
