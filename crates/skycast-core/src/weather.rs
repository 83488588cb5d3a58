use serde::{Serialize, Serializer};

/// Marker emitted for any optional field the page did not provide.
pub const UNAVAILABLE: &str = "N/A";

/// Weather observation scraped from the upstream page.
///
/// Only `temperature` and `condition` are guaranteed to carry real data;
/// every other field degrades to [`UNAVAILABLE`] (or `null` for `date`)
/// instead of failing the whole record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRecord {
    /// Date label exactly as scraped; no calendar parsing is attempted.
    pub date: Option<String>,
    /// Display-form temperature including its unit glyph, e.g. `"21°"`.
    pub temperature: String,
    /// Free-text condition label, e.g. `"Partly cloudy"`.
    pub condition: String,
    pub min_temperature: String,
    pub max_temperature: String,
    pub humidity: String,
    pub pressure: Pressure,
}

/// Pressure reading after magnitude-based scale inference.
///
/// Serializes the way the public API has always exposed it: scaled readings
/// as a two-decimal string (`"1013.00"`), unscaled readings as a bare integer
/// (`760`), and missing readings as `"N/A"`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pressure {
    /// Value that was divided down from a Pa/dPa-like magnitude, rounded to
    /// two decimal places.
    Scaled(f64),
    /// Value already in range, rounded to the nearest integer.
    Whole(i64),
    Unavailable,
}

impl std::fmt::Display for Pressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pressure::Scaled(v) => write!(f, "{v:.2}"),
            Pressure::Whole(v) => write!(f, "{v}"),
            Pressure::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for Pressure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Pressure::Whole(v) => serializer.serialize_i64(*v),
            Pressure::Scaled(_) | Pressure::Unavailable => serializer.collect_str(self),
        }
    }
}
