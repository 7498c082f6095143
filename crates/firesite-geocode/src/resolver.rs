//! Provider cascade that resolves one coordinate per forest.
//!
//! Order per query candidate: forest-boundary service, Google, Nominatim.
//! The first plausible answer wins and is cached under both the query key and
//! the forest's alias key. Provider failures only ever become attempts and
//! warnings; a cache that stays corrupt after recreation is the one error
//! returned to the caller.

use std::time::Duration;

use firesite_core::AppConfig;
use futures::stream::{self, StreamExt};
use reqwest::Client;

use crate::budget::LookupBudget;
use crate::cache::{CacheKey, GeocodeCache, KeyValueStore};
use crate::error::GeocodeError;
use crate::providers::nominatim::LocalInstance;
use crate::providers::{
    ForestServiceClient, GoogleGeocoder, NominatimClient, ProviderLookup, RetryPolicy,
};
use crate::query::{implausibility, mentions_forest_area, query_candidates, references_forest};
use crate::types::{ForestCoordinates, ForestQuery, GeocodeHit, LookupAttempt, LookupOutcome};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Provider endpoints, credentials, and limits for a [`GeocodeResolver`].
#[derive(Clone)]
pub struct GeocodeSettings {
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub forest_service_url: Option<String>,
    pub google_api_key: Option<String>,
    pub google_base_url: String,
    pub google_max_new_lookups: u32,
    pub nominatim_base_url: String,
    pub nominatim_delay_ms: u64,
    pub nominatim_local: Option<LocalInstance>,
}

impl std::fmt::Debug for GeocodeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodeSettings")
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("forest_service_url", &self.forest_service_url)
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("google_base_url", &self.google_base_url)
            .field("google_max_new_lookups", &self.google_max_new_lookups)
            .field("nominatim_base_url", &self.nominatim_base_url)
            .field("nominatim_delay_ms", &self.nominatim_delay_ms)
            .field("nominatim_local", &self.nominatim_local)
            .finish()
    }
}

impl From<&AppConfig> for GeocodeSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            request_timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            forest_service_url: config.forest_service_url.clone(),
            google_api_key: config.google_api_key.clone(),
            google_base_url: config.google_base_url.clone(),
            google_max_new_lookups: config.google_max_new_lookups,
            nominatim_base_url: config.nominatim_base_url.clone(),
            nominatim_delay_ms: config.nominatim_delay_ms,
            nominatim_local: config.nominatim_local_url.as_ref().map(|url| LocalInstance {
                base_url: url.clone(),
                delay_ms: config.nominatim_local_delay_ms,
                retries_on_429: config.nominatim_local_429_retries,
                delay_on_429_ms: config.nominatim_local_429_delay_ms,
            }),
        }
    }
}

/// One forest's outcome from [`GeocodeResolver::resolve_many`].
#[derive(Debug, Clone)]
pub struct ForestResolution {
    pub forest: ForestQuery,
    pub coordinates: ForestCoordinates,
}

pub struct GeocodeResolver<S> {
    cache: GeocodeCache<S>,
    forest_service: ForestServiceClient,
    google: GoogleGeocoder,
    nominatim: NominatimClient,
    budget: LookupBudget,
}

impl<S: KeyValueStore + 'static> GeocodeResolver<S> {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built, or
    /// [`GeocodeError::InvalidBaseUrl`] if a configured endpoint does not parse.
    pub fn new(settings: &GeocodeSettings, cache: GeocodeCache<S>) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        let retry = RetryPolicy {
            max_retries: settings.max_retries,
            backoff_base_ms: settings.retry_backoff_base_ms,
        };

        Ok(Self {
            cache,
            forest_service: ForestServiceClient::new(
                client.clone(),
                settings.forest_service_url.as_deref(),
                retry,
            )?,
            google: GoogleGeocoder::new(
                client.clone(),
                settings.google_api_key.as_deref(),
                &settings.google_base_url,
                retry,
            )?,
            nominatim: NominatimClient::new(
                client,
                &settings.nominatim_base_url,
                settings.nominatim_delay_ms,
                settings.nominatim_local.clone(),
                retry,
            )?,
            budget: LookupBudget::new(settings.google_max_new_lookups),
        })
    }

    #[must_use]
    pub fn cache(&self) -> &GeocodeCache<S> {
        &self.cache
    }

    #[must_use]
    pub fn budget(&self) -> &LookupBudget {
        &self.budget
    }

    /// Starts a new pipeline run's Google budget.
    pub fn reset_budget(&self) {
        self.budget.reset();
    }

    /// Resolves coordinates for `forest_name`, using `hint` as an alternative
    /// spelling.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::StorageCorruption`] only, when the cache store
    /// cannot be written even after recreation. Every provider failure is
    /// reported through `attempts` and `warnings` instead.
    pub async fn resolve_forest_coordinates(
        &self,
        forest_name: &str,
        hint: Option<&str>,
    ) -> Result<ForestCoordinates, GeocodeError> {
        let mut out = ForestCoordinates::default();
        let forest_name = forest_name.trim();
        if forest_name.is_empty() {
            out.warnings.push("empty forest name".to_string());
            return Ok(out);
        }

        let alias = CacheKey::alias(forest_name);
        if !alias.is_empty() {
            if let Some(hit) = self.cache.get(&alias).await {
                if references_forest(&hit.display_name, forest_name, hint) {
                    out.attempts.push(LookupAttempt::new(
                        hit.provider,
                        forest_name,
                        LookupOutcome::CacheHit,
                    ));
                    out.apply_hit(&hit);
                    return Ok(out);
                }
                tracing::warn!(
                    forest = forest_name,
                    cached = %hit.display_name,
                    "cached coordinates no longer match forest; discarding"
                );
                out.warnings.push(format!(
                    "discarded stale cached coordinates \"{}\" for {forest_name}",
                    hit.display_name
                ));
                self.cache.delete(&alias).await;
            }
        }

        for query in query_candidates(forest_name, hint) {
            let query_key = CacheKey::query(&query);
            if let Some(hit) = self.cache.get(&query_key).await {
                if implausibility(&query, &hit.display_name).is_none() {
                    out.attempts
                        .push(LookupAttempt::new(hit.provider, &query, LookupOutcome::CacheHit));
                    if !alias.is_empty() {
                        let promoted = self
                            .cache
                            .promote_to_alias(&query_key, &alias)
                            .await
                            .map(|_| ());
                        absorb_cache_error(promoted, &mut out)?;
                    }
                    out.apply_hit(&hit);
                    return Ok(out);
                }
                self.cache.delete(&query_key).await;
            }

            if let Some(hit) = self.run_cascade(&query, &mut out).await {
                absorb_cache_error(self.cache.put(&query_key, &hit).await, &mut out)?;
                if !alias.is_empty() {
                    absorb_cache_error(self.cache.put(&alias, &hit).await, &mut out)?;
                }
                tracing::info!(
                    forest = forest_name,
                    query = %query,
                    provider = %hit.provider,
                    confidence = hit.confidence,
                    "resolved forest coordinates"
                );
                out.apply_hit(&hit);
                return Ok(out);
            }
        }

        tracing::warn!(
            forest = forest_name,
            attempts = out.attempts.len(),
            "no geocoder resolved forest coordinates"
        );
        out.warnings.push(format!(
            "no coordinates resolved for {forest_name} after {} attempts",
            out.attempts.len()
        ));
        Ok(out)
    }

    /// Resolves every forest with at most `concurrency` lookups in flight.
    /// Results keep the input order; the Google budget is shared.
    ///
    /// # Errors
    ///
    /// Returns the first [`GeocodeError::StorageCorruption`] encountered.
    pub async fn resolve_many(
        &self,
        forests: &[ForestQuery],
        concurrency: usize,
    ) -> Result<Vec<ForestResolution>, GeocodeError> {
        let mut results: Vec<(usize, Result<ForestCoordinates, GeocodeError>)> =
            stream::iter(forests.iter().enumerate())
                .map(|(idx, forest)| {
                    let fut = self.resolve_forest_coordinates(&forest.name, forest.hint.as_deref());
                    async move { (idx, fut.await) }
                })
                .buffer_unordered(concurrency.max(1))
                .collect()
                .await;
        results.sort_by_key(|(idx, _)| *idx);

        let mut resolutions = Vec::with_capacity(results.len());
        for (idx, result) in results {
            resolutions.push(ForestResolution {
                forest: forests[idx].clone(),
                coordinates: result?,
            });
        }
        Ok(resolutions)
    }

    async fn run_cascade(&self, query: &str, out: &mut ForestCoordinates) -> Option<GeocodeHit> {
        let lookup = self.forest_service.lookup(query).await;
        if let Some(hit) = accept(query, lookup, out) {
            return Some(hit);
        }

        let lookup = self.google.lookup(query, &self.budget).await;
        if let Some(hit) = accept(query, lookup, out) {
            if mentions_forest_area(&hit.display_name) {
                return Some(hit);
            }
            // OSM boundaries often carry a better centroid than Google's area pin.
            let lookup = self.nominatim.lookup(query).await;
            if let Some(alternative) = accept(query, lookup, out) {
                if mentions_forest_area(&alternative.display_name) {
                    tracing::debug!(
                        query,
                        google = %hit.display_name,
                        nominatim = %alternative.display_name,
                        "preferring nominatim result that names the forest area"
                    );
                    return Some(alternative);
                }
            }
            return Some(hit);
        }

        let lookup = self.nominatim.lookup(query).await;
        accept(query, lookup, out)
    }
}

/// Applies the plausibility filter, records the attempts, and returns the hit
/// if it survives.
fn accept(query: &str, lookup: ProviderLookup, out: &mut ForestCoordinates) -> Option<GeocodeHit> {
    let ProviderLookup { mut attempts, hit } = lookup;
    let hit = hit.and_then(|hit| match implausibility(query, &hit.display_name) {
        None => Some(hit),
        Some(reason) => {
            if let Some(last) = attempts.last_mut() {
                last.outcome = LookupOutcome::ImplausibleResult;
                last.error_message = Some(reason);
            }
            None
        }
    });

    for attempt in attempts
        .iter()
        .filter(|a| a.outcome == LookupOutcome::ImplausibleResult)
    {
        let reason = attempt
            .error_message
            .as_deref()
            .unwrap_or("implausible result");
        tracing::warn!(
            provider = %attempt.provider,
            query = %attempt.query,
            reason,
            "rejected implausible geocoder result"
        );
        out.warnings.push(format!(
            "{} result for \"{}\" rejected: {reason}",
            attempt.provider, attempt.query
        ));
    }

    out.attempts.extend(attempts);
    hit
}

/// Cache write failures are warnings unless the store is persistently corrupt.
fn absorb_cache_error(
    result: Result<(), GeocodeError>,
    out: &mut ForestCoordinates,
) -> Result<(), GeocodeError> {
    match result {
        Ok(()) => Ok(()),
        Err(err @ GeocodeError::StorageCorruption(_)) => Err(err),
        Err(err) => {
            tracing::warn!(error = %err, "failed to cache geocode hit");
            out.warnings.push(format!("coordinates not cached: {err}"));
            Ok(())
        }
    }
}
