//! Pure conversions from scraped text blobs to record field values.
//!
//! Upstream markup packs several readings into one element (min/max
//! temperature, humidity + pressure) and reports pressure in whichever
//! scale the page happens to use. Nothing here fails: unreadable input
//! degrades to [`UNAVAILABLE`] / [`Pressure::Unavailable`].

use std::sync::LazyLock;

use regex::Regex;
use skycast_core::{Pressure, UNAVAILABLE};

static TEMPERATURE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+°").expect("valid temperature regex"));
static LEADING_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number regex")
});

/// Above this magnitude a reading is taken to be in Pa (÷100 → hPa).
const PASCAL_THRESHOLD: f64 = 10_000.0;
/// Above this magnitude a reading is taken to be in dPa-like units (÷10).
const DECI_THRESHOLD: f64 = 1_000.0;

/// Humidity and the still-unparsed pressure token split out of one blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumidityPressure {
    pub humidity: String,
    pub pressure: String,
}

impl HumidityPressure {
    fn unavailable() -> Self {
        Self {
            humidity: UNAVAILABLE.to_owned(),
            pressure: UNAVAILABLE.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinMaxTemperature {
    pub min: String,
    pub max: String,
}

/// Splits a `"…pressure.humidity"` blob on `.`.
///
/// The last segment is humidity and the second-to-last is the raw pressure
/// token. Missing text, or text without any `.`, yields `"N/A"` for both;
/// a blank segment yields `"N/A"` for that side only.
#[must_use]
pub fn split_humidity_pressure(raw: Option<&str>) -> HumidityPressure {
    let Some(raw) = raw.filter(|s| !s.is_empty()) else {
        return HumidityPressure::unavailable();
    };

    let parts: Vec<&str> = raw.split('.').collect();
    let [.., pressure, humidity] = parts.as_slice() else {
        return HumidityPressure::unavailable();
    };

    HumidityPressure {
        humidity: non_blank_or_unavailable(humidity),
        pressure: non_blank_or_unavailable(pressure),
    }
}

/// Converts a raw pressure token to a reading, inferring the scale from
/// magnitude alone.
///
/// First match wins:
/// 1. `> 10000` → ÷100, two decimals (Pa → hPa).
/// 2. `> 1000` → ÷10, two decimals.
/// 3. otherwise → nearest integer.
///
/// Known limitation: an hPa reading that is already above 1000 (e.g. a
/// genuine `1013` hPa) is indistinguishable from a ÷10 scale and gets
/// divided. No unit label is available upstream to tell them apart.
#[must_use]
pub fn normalize_pressure(raw: &str) -> Pressure {
    let Some(value) = parse_leading_number(raw) else {
        return Pressure::Unavailable;
    };

    if value > PASCAL_THRESHOLD {
        Pressure::Scaled(round_to_hundredths(value / 100.0))
    } else if value > DECI_THRESHOLD {
        Pressure::Scaled(round_to_hundredths(value / 10.0))
    } else {
        #[allow(clippy::cast_possible_truncation)]
        let whole = value.round() as i64;
        Pressure::Whole(whole)
    }
}

/// Picks the first two `<digits>°` tokens as min and max.
///
/// Whichever token is missing becomes `"N/A"`.
#[must_use]
pub fn split_min_max_temperature(raw: Option<&str>) -> MinMaxTemperature {
    let mut tokens = raw
        .into_iter()
        .flat_map(|text| TEMPERATURE_TOKEN_RE.find_iter(text))
        .map(|m| m.as_str().to_owned());

    let min = tokens.next().unwrap_or_else(|| UNAVAILABLE.to_owned());
    let max = tokens.next().unwrap_or_else(|| UNAVAILABLE.to_owned());
    MinMaxTemperature { min, max }
}

/// Parses the longest numeric prefix of `raw` after leading whitespace.
///
/// Trailing text is ignored (`"1013 hPa"` → `1013.0`). Returns `None` when
/// there is no numeric prefix or the value is not finite.
#[must_use]
pub(crate) fn parse_leading_number(raw: &str) -> Option<f64> {
    let m = LEADING_NUMBER_RE.find(raw.trim_start())?;
    m.as_str().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn non_blank_or_unavailable(segment: &str) -> String {
    let trimmed = segment.trim();
    if trimmed.is_empty() {
        UNAVAILABLE.to_owned()
    } else {
        trimmed.to_owned()
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
