use crate::ConfigError;

/// Logical fields pulled from the upstream weather page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeatherField {
    Temperature,
    MinMaxTemperature,
    HumidityPressure,
    Condition,
    Date,
}

impl WeatherField {
    pub const ALL: [WeatherField; 5] = [
        WeatherField::Temperature,
        WeatherField::MinMaxTemperature,
        WeatherField::HumidityPressure,
        WeatherField::Condition,
        WeatherField::Date,
    ];

    /// Environment variable that carries this field's selector.
    #[must_use]
    pub fn env_var(self) -> &'static str {
        match self {
            WeatherField::Temperature => "TEMPERATURE_CLASS",
            WeatherField::MinMaxTemperature => "MIN_MAX_TEMPERATURE_CLASS",
            WeatherField::HumidityPressure => "HUMIDITY_PRESSURE_CLASS",
            WeatherField::Condition => "CONDITION_CLASS",
            WeatherField::Date => "DATE_CLASS",
        }
    }

    /// Whether a record can be built without this field.
    #[must_use]
    pub fn is_required(self) -> bool {
        matches!(self, WeatherField::Temperature | WeatherField::Condition)
    }
}

impl std::fmt::Display for WeatherField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherField::Temperature => write!(f, "temperature"),
            WeatherField::MinMaxTemperature => write!(f, "minMaxTemperature"),
            WeatherField::HumidityPressure => write!(f, "humidityPressure"),
            WeatherField::Condition => write!(f, "condition"),
            WeatherField::Date => write!(f, "date"),
        }
    }
}

/// Document selectors for every [`WeatherField`], one string each.
///
/// Built once at startup and shared read-only between requests. Selector
/// strings are opaque here; CSS syntax is checked by the scraper crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub temperature: String,
    pub min_max_temperature: String,
    pub humidity_pressure: String,
    pub condition: String,
    pub date: String,
}

impl SelectorConfig {
    /// Builds a selector set from a lookup keyed by [`WeatherField`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] for the first field the lookup
    /// cannot resolve, or [`ConfigError::InvalidEnvVar`] when the selector is
    /// blank.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(WeatherField) -> Option<String>,
    {
        let resolve = |field: WeatherField| -> Result<String, ConfigError> {
            let raw = lookup(field)
                .ok_or_else(|| ConfigError::MissingEnvVar(field.env_var().to_string()))?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::InvalidEnvVar {
                    var: field.env_var().to_string(),
                    reason: "selector must not be blank".to_string(),
                });
            }
            Ok(trimmed.to_string())
        };

        Ok(Self {
            temperature: resolve(WeatherField::Temperature)?,
            min_max_temperature: resolve(WeatherField::MinMaxTemperature)?,
            humidity_pressure: resolve(WeatherField::HumidityPressure)?,
            condition: resolve(WeatherField::Condition)?,
            date: resolve(WeatherField::Date)?,
        })
    }

    /// Returns the selector configured for `field`.
    #[must_use]
    pub fn selector(&self, field: WeatherField) -> &str {
        match field {
            WeatherField::Temperature => &self.temperature,
            WeatherField::MinMaxTemperature => &self.min_max_temperature,
            WeatherField::HumidityPressure => &self.humidity_pressure,
            WeatherField::Condition => &self.condition,
            WeatherField::Date => &self.date,
        }
    }

    /// Iterates `(field, selector)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (WeatherField, &str)> + '_ {
        WeatherField::ALL
            .into_iter()
            .map(move |field| (field, self.selector(field)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_all(field: WeatherField) -> Option<String> {
        Some(format!(".{field}"))
    }

    #[test]
    fn from_lookup_resolves_every_field() {
        let config = SelectorConfig::from_lookup(lookup_all).expect("valid selectors");
        assert_eq!(config.temperature, ".temperature");
        assert_eq!(config.min_max_temperature, ".minMaxTemperature");
        assert_eq!(config.humidity_pressure, ".humidityPressure");
        assert_eq!(config.condition, ".condition");
        assert_eq!(config.date, ".date");
    }

    #[test]
    fn from_lookup_reports_missing_field_by_env_var() {
        let result = SelectorConfig::from_lookup(|field| {
            (field != WeatherField::Condition).then(|| ".x".to_string())
        });
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "CONDITION_CLASS"),
            "expected MissingEnvVar(CONDITION_CLASS), got: {result:?}"
        );
    }

    #[test]
    fn from_lookup_rejects_blank_selector() {
        let result = SelectorConfig::from_lookup(|field| {
            Some(if field == WeatherField::Date { "   ".to_string() } else { ".x".to_string() })
        });
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "DATE_CLASS"),
            "expected InvalidEnvVar(DATE_CLASS), got: {result:?}"
        );
    }

    #[test]
    fn from_lookup_trims_surrounding_whitespace() {
        let config =
            SelectorConfig::from_lookup(|_| Some("  .wx-temp  ".to_string())).expect("valid");
        assert_eq!(config.selector(WeatherField::Temperature), ".wx-temp");
    }

    #[test]
    fn iter_visits_fields_in_order() {
        let config = SelectorConfig::from_lookup(lookup_all).expect("valid selectors");
        let fields: Vec<_> = config.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, WeatherField::ALL.to_vec());
    }

    #[test]
    fn only_temperature_and_condition_are_required() {
        let required: Vec<_> = WeatherField::ALL
            .into_iter()
            .filter(|f| f.is_required())
            .collect();
        assert_eq!(
            required,
            vec![WeatherField::Temperature, WeatherField::Condition]
        );
    }
}
