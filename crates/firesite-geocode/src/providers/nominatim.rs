//! Nominatim (OpenStreetMap) adapter.
//!
//! A self-hosted instance, when configured, is tried first with its own
//! fixed-delay 429 policy. Unless it yields a plausible hit, the public
//! instance is then used with a throttle shared by every concurrent lookup so
//! the usage-policy delay holds globally.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{failed_attempt, get_json, parse_base_url, ProviderLookup, RetryPolicy};
use crate::error::GeocodeError;
use crate::query::implausibility;
use crate::retry::retry_with_backoff;
use crate::types::{valid_coordinates, GeocodeHit, GeocodeProvider, LookupAttempt, LookupOutcome};

const PROVIDER: GeocodeProvider = GeocodeProvider::Nominatim;
const RESULT_LIMIT: &str = "5";
const COUNTRY_CODES: &str = "au";

#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: Option<String>,
    lon: Option<String>,
    #[serde(default)]
    display_name: String,
    importance: Option<f64>,
}

/// Enforces a minimum interval between requests across tasks.
#[derive(Debug)]
pub(crate) struct Throttle {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Waits until `interval` has passed since the previous caller was let through.
    pub(crate) async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Self-hosted instance settings.
#[derive(Debug, Clone)]
pub struct LocalInstance {
    pub base_url: String,
    /// Pause before every local request.
    pub delay_ms: u64,
    pub retries_on_429: u32,
    pub delay_on_429_ms: u64,
}

struct ResolvedLocal {
    search_url: Url,
    delay: Duration,
    retries_on_429: u32,
    delay_on_429: Duration,
}

pub struct NominatimClient {
    client: Client,
    public_search_url: Url,
    local: Option<ResolvedLocal>,
    throttle: Throttle,
    retry: RetryPolicy,
}

impl NominatimClient {
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidBaseUrl`] if either base URL does not parse.
    pub fn new(
        client: Client,
        public_base_url: &str,
        public_delay_ms: u64,
        local: Option<LocalInstance>,
        retry: RetryPolicy,
    ) -> Result<Self, GeocodeError> {
        let local = local
            .map(|l| -> Result<ResolvedLocal, GeocodeError> {
                Ok(ResolvedLocal {
                    search_url: search_url(&l.base_url)?,
                    delay: Duration::from_millis(l.delay_ms),
                    retries_on_429: l.retries_on_429,
                    delay_on_429: Duration::from_millis(l.delay_on_429_ms),
                })
            })
            .transpose()?;
        Ok(Self {
            client,
            public_search_url: search_url(public_base_url)?,
            local,
            throttle: Throttle::new(Duration::from_millis(public_delay_ms)),
            retry,
        })
    }

    pub async fn lookup(&self, query: &str) -> ProviderLookup {
        let mut attempts = Vec::new();

        if let Some(local) = &self.local {
            let lookup = self.lookup_local(local, query).await;
            attempts.extend(lookup.attempts);
            if let Some(hit) = lookup.hit {
                return ProviderLookup {
                    attempts,
                    hit: Some(hit),
                };
            }
        }

        let url = with_query(&self.public_search_url, query);
        let result = retry_with_backoff(
            PROVIDER.as_str(),
            self.retry.max_retries,
            self.retry.backoff_base_ms,
            move || {
                let url = url.clone();
                async move {
                    self.throttle.wait().await;
                    let body = get_json(&self.client, url, "nominatim search").await?;
                    parse_results(body)
                }
            },
        )
        .await;

        let lookup = match result {
            Ok(results) => select_result(query, &results),
            Err(err) => ProviderLookup::failed(failed_attempt(PROVIDER, query, &err)),
        };
        attempts.extend(lookup.attempts);
        ProviderLookup {
            attempts,
            hit: lookup.hit,
        }
    }

    /// Only 429 is retried locally; anything else falls through to the public instance.
    async fn lookup_local(&self, local: &ResolvedLocal, query: &str) -> ProviderLookup {
        let url = with_query(&local.search_url, query);
        let mut retries = 0u32;
        loop {
            tokio::time::sleep(local.delay).await;
            let result = get_json(&self.client, url.clone(), "local nominatim search").await;
            match result.and_then(parse_results) {
                Ok(results) => return select_result(query, &results),
                Err(GeocodeError::HttpStatus { status: 429, .. })
                    if retries < local.retries_on_429 =>
                {
                    retries += 1;
                    tracing::warn!(
                        query,
                        attempt = retries,
                        max_retries = local.retries_on_429,
                        delay_ms = u64::try_from(local.delay_on_429.as_millis()).unwrap_or(u64::MAX),
                        "local nominatim rate limited, retrying"
                    );
                    tokio::time::sleep(local.delay_on_429).await;
                }
                Err(err) => {
                    let attempt = failed_attempt(PROVIDER, query, &err)
                        .with_error(format!("local instance: {err}"));
                    return ProviderLookup::failed(attempt);
                }
            }
        }
    }
}

fn search_url(base_url: &str) -> Result<Url, GeocodeError> {
    let base = parse_base_url(&format!("{}/", base_url.trim().trim_end_matches('/')))?;
    base.join("search")
        .map_err(|e| GeocodeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })
}

fn with_query(search_url: &Url, query: &str) -> Url {
    let mut url = search_url.clone();
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("format", "jsonv2")
        .append_pair("limit", RESULT_LIMIT)
        .append_pair("countrycodes", COUNTRY_CODES);
    url
}

fn parse_results(body: serde_json::Value) -> Result<Vec<SearchResult>, GeocodeError> {
    serde_json::from_value(body).map_err(|e| GeocodeError::Deserialize {
        context: "nominatim search response".to_string(),
        source: e,
    })
}

/// First plausible result with parseable, in-range coordinates. Importance
/// is the confidence.
fn select_result(query: &str, results: &[SearchResult]) -> ProviderLookup {
    if results.is_empty() {
        return ProviderLookup::failed(
            LookupAttempt::new(PROVIDER, query, LookupOutcome::EmptyResult).with_count(0),
        );
    }

    let mut rejected: Option<String> = None;
    for result in results {
        let Some((lat, lon)) = coordinates(result) else {
            continue;
        };
        if let Some(reason) = implausibility(query, &result.display_name) {
            rejected.get_or_insert(reason);
            continue;
        }
        let hit = GeocodeHit::new(
            lat,
            lon,
            &result.display_name,
            result.importance.unwrap_or(0.0),
            PROVIDER,
        );
        return ProviderLookup::found(
            LookupAttempt::new(PROVIDER, query, LookupOutcome::Success).with_count(results.len()),
            hit,
        );
    }

    let attempt = match rejected {
        Some(reason) => {
            LookupAttempt::new(PROVIDER, query, LookupOutcome::ImplausibleResult).with_error(reason)
        }
        None => LookupAttempt::new(PROVIDER, query, LookupOutcome::InvalidCoordinates),
    };
    ProviderLookup::failed(attempt.with_count(results.len()))
}

fn coordinates(result: &SearchResult) -> Option<(f64, f64)> {
    let lat = result.lat.as_deref()?.trim().parse::<f64>().ok()?;
    let lon = result.lon.as_deref()?.trim().parse::<f64>().ok()?;
    valid_coordinates(lat, lon).then_some((lat, lon))
}
