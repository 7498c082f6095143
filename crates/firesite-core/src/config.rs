use crate::app_config::AppConfig;
use crate::ConfigError;

const DEFAULT_GOOGLE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can feed a `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
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

    let log_level = or_default("FIRESITE_LOG_LEVEL", "info");
    let geocode_cache_path = PathBuf::from(or_default(
        "FIRESITE_GEOCODE_CACHE_PATH",
        "./data/geocode-cache.sqlite",
    ));
    let geocode_cache_ttl_secs = parse_ttl(optional("FIRESITE_GEOCODE_CACHE_TTL_SECS"))?;

    let request_timeout_secs = parse_u64("FIRESITE_REQUEST_TIMEOUT_SECS", "20")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FIRESITE_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("FIRESITE_USER_AGENT", "firesite/0.1 (campfire-finder)");
    let max_retries = parse_u32("FIRESITE_MAX_RETRIES", "3")?;
    let retry_backoff_base_ms = parse_u64("FIRESITE_RETRY_BACKOFF_BASE_MS", "500")?;
    let max_concurrent_lookups = parse_usize("FIRESITE_MAX_CONCURRENT_LOOKUPS", "4")?;

    let forest_service_url = optional("FIRESITE_FOREST_SERVICE_URL");

    let google_api_key = optional("GOOGLE_MAPS_API_KEY");
    let google_base_url = or_default("FIRESITE_GOOGLE_BASE_URL", DEFAULT_GOOGLE_BASE_URL);
    let google_max_new_lookups = parse_u32("FIRESITE_GOOGLE_MAX_NEW_LOOKUPS", "200")?;

    let nominatim_base_url = or_default("FIRESITE_NOMINATIM_BASE_URL", DEFAULT_NOMINATIM_BASE_URL);
    let nominatim_local_url = optional("FIRESITE_NOMINATIM_LOCAL_URL");
    let nominatim_delay_ms = parse_u64("FIRESITE_NOMINATIM_DELAY_MS", "1100")?;
    let nominatim_local_delay_ms = parse_u64("FIRESITE_NOMINATIM_LOCAL_DELAY_MS", "200")?;
    let nominatim_local_429_retries = parse_u32("FIRESITE_NOMINATIM_LOCAL_429_RETRIES", "3")?;
    let nominatim_local_429_delay_ms =
        parse_u64("FIRESITE_NOMINATIM_LOCAL_429_DELAY_MS", "2000")?;

    Ok(AppConfig {
        log_level,
        geocode_cache_path,
        geocode_cache_ttl_secs,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        max_concurrent_lookups,
        forest_service_url,
        google_api_key,
        google_base_url,
        google_max_new_lookups,
        nominatim_base_url,
        nominatim_local_url,
        nominatim_delay_ms,
        nominatim_local_delay_ms,
        nominatim_local_429_retries,
        nominatim_local_429_delay_ms,
    })
}

/// Parse the optional cache TTL. Absent means "never expire"; zero is rejected
/// because it would make every cached hit instantly stale.
fn parse_ttl(raw: Option<String>) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let secs = raw
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "FIRESITE_GEOCODE_CACHE_TTL_SECS".to_string(),
            reason: e.to_string(),
        })?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FIRESITE_GEOCODE_CACHE_TTL_SECS".to_string(),
            reason: "TTL must be greater than zero".to_string(),
        });
    }
    Ok(Some(secs))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
