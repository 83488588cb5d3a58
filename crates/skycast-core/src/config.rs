use crate::app_config::{AppConfig, Environment};
use crate::selectors::SelectorConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::{Ipv4Addr, SocketAddr};

    let require = |var: &str| -> Result<String, ConfigError> {
        let raw = lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))?;
        if raw.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "value must not be blank".to_string(),
            });
        }
        Ok(raw)
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u16 = |var: &str, default: &str| -> Result<u16, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u16>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let scrape_url_prefix = require("SCRAPE_API_FIRST")?;
    let scrape_url_suffix = require("SCRAPE_API_LAST")?;
    let selectors = SelectorConfig::from_lookup(|field| lookup(field.env_var()).ok())?;

    let env = parse_environment(&or_default("SKYCAST_ENV", "development"));

    let port = parse_u16("PORT", "5000")?;
    let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let log_level = or_default("SKYCAST_LOG_LEVEL", "info");

    let scraper_request_timeout_secs = parse_u64("SKYCAST_SCRAPER_REQUEST_TIMEOUT_SECS", "5")?;
    let scraper_user_agent = or_default(
        "SKYCAST_SCRAPER_USER_AGENT",
        "skycast/0.1 (weather-scraper)",
    );
    let rate_limit_max_requests = parse_usize("SKYCAST_RATE_LIMIT_MAX_REQUESTS", "100")?;
    let rate_limit_window_secs = parse_u64("SKYCAST_RATE_LIMIT_WINDOW_SECS", "900")?;
    if rate_limit_window_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SKYCAST_RATE_LIMIT_WINDOW_SECS".to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        scrape_url_prefix,
        scrape_url_suffix,
        selectors,
        scraper_request_timeout_secs,
        scraper_user_agent,
        rate_limit_max_requests,
        rate_limit_window_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
