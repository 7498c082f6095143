use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub geocode_cache_path: PathBuf,
    /// `None` keeps cache entries indefinitely.
    pub geocode_cache_ttl_secs: Option<u64>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub max_concurrent_lookups: usize,
    pub forest_service_url: Option<String>,
    pub google_api_key: Option<String>,
    pub google_base_url: String,
    pub google_max_new_lookups: u32,
    pub nominatim_base_url: String,
    pub nominatim_local_url: Option<String>,
    pub nominatim_delay_ms: u64,
    pub nominatim_local_delay_ms: u64,
    pub nominatim_local_429_retries: u32,
    pub nominatim_local_429_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("geocode_cache_path", &self.geocode_cache_path)
            .field("geocode_cache_ttl_secs", &self.geocode_cache_ttl_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("max_concurrent_lookups", &self.max_concurrent_lookups)
            .field("forest_service_url", &self.forest_service_url)
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("google_base_url", &self.google_base_url)
            .field("google_max_new_lookups", &self.google_max_new_lookups)
            .field("nominatim_base_url", &self.nominatim_base_url)
            .field("nominatim_local_url", &self.nominatim_local_url)
            .field("nominatim_delay_ms", &self.nominatim_delay_ms)
            .field("nominatim_local_delay_ms", &self.nominatim_local_delay_ms)
            .field(
                "nominatim_local_429_retries",
                &self.nominatim_local_429_retries,
            )
            .field(
                "nominatim_local_429_delay_ms",
                &self.nominatim_local_429_delay_ms,
            )
            .finish()
    }
}
