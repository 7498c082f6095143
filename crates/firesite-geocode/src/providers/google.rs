//! Google Geocoding API adapter.
//!
//! Metered: every live request draws from the run's [`LookupBudget`].
//! Confidence comes from the returned place types, and street-level results
//! are never accepted for a forest.

use reqwest::{Client, Url};
use serde::Deserialize;

use super::{failed_attempt, get_json, parse_base_url, ProviderLookup, RetryPolicy};
use crate::budget::LookupBudget;
use crate::error::GeocodeError;
use crate::query::implausibility;
use crate::retry::retry_with_backoff;
use crate::types::{valid_coordinates, GeocodeHit, GeocodeProvider, LookupAttempt, LookupOutcome};

const PROVIDER: GeocodeProvider = GeocodeProvider::Google;
const REGION: &str = "au";

const EXACT_TYPES: &[&str] = &[
    "natural_feature",
    "park",
    "point_of_interest",
    "establishment",
    "tourist_attraction",
    "campground",
];
const AREA_TYPES: &[&str] = &[
    "locality",
    "political",
    "administrative_area_level_1",
    "administrative_area_level_2",
    "administrative_area_level_3",
    "sublocality",
    "colloquial_area",
    "neighborhood",
    "postal_code",
];
const STREET_TYPES: &[&str] = &[
    "street_address",
    "route",
    "premise",
    "subpremise",
    "street_number",
    "intersection",
];

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    geometry: Option<ResultGeometry>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResultGeometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

pub struct GoogleGeocoder {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
    retry: RetryPolicy,
}

impl GoogleGeocoder {
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(
        client: Client,
        api_key: Option<&str>,
        base_url: &str,
        retry: RetryPolicy,
    ) -> Result<Self, GeocodeError> {
        Ok(Self {
            client,
            api_key: api_key
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            base_url: parse_base_url(base_url)?,
            retry,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Geocodes `query`, drawing one call from `budget` if a request is sent.
    pub async fn lookup(&self, query: &str, budget: &LookupBudget) -> ProviderLookup {
        let Some(api_key) = &self.api_key else {
            let err = GeocodeError::ProviderUnavailable("GOOGLE_MAPS_API_KEY not set".into());
            return ProviderLookup::failed(failed_attempt(PROVIDER, query, &err));
        };
        if !budget.try_acquire() {
            tracing::debug!(query, limit = budget.limit(), "google lookup budget exhausted");
            return ProviderLookup::failed(
                LookupAttempt::new(PROVIDER, query, LookupOutcome::LimitReached).with_error(
                    format!("new-lookup budget of {} exhausted", budget.limit()),
                ),
            );
        }

        let url = self.build_url(query, api_key);
        let result = retry_with_backoff(
            PROVIDER.as_str(),
            self.retry.max_retries,
            self.retry.backoff_base_ms,
            move || {
                let url = url.clone();
                async move {
                    let body = get_json(&self.client, url, "google geocode").await?;
                    parse_response(body)
                }
            },
        )
        .await;

        match result {
            Ok(results) => select_result(query, &results),
            Err(err) => ProviderLookup::failed(failed_attempt(PROVIDER, query, &err)),
        }
    }

    fn build_url(&self, query: &str, api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("address", query)
            .append_pair("region", REGION)
            .append_pair("key", api_key);
        url
    }
}

fn parse_response(body: serde_json::Value) -> Result<Vec<GeocodeResult>, GeocodeError> {
    let response: GeocodeResponse =
        serde_json::from_value(body).map_err(|e| GeocodeError::Deserialize {
            context: "google geocode response".to_string(),
            source: e,
        })?;
    match response.status.as_str() {
        "OK" => Ok(response.results),
        "ZERO_RESULTS" => Ok(Vec::new()),
        other => Err(GeocodeError::Api(match response.error_message {
            Some(message) => format!("{other}: {message}"),
            None => other.to_string(),
        })),
    }
}

/// First plausible result that is not street-level and has valid coordinates.
fn select_result(query: &str, results: &[GeocodeResult]) -> ProviderLookup {
    if results.is_empty() {
        return ProviderLookup::failed(
            LookupAttempt::new(PROVIDER, query, LookupOutcome::EmptyResult).with_count(0),
        );
    }

    let mut street_level = 0usize;
    let mut rejected: Option<String> = None;
    for result in results {
        if is_street_level(&result.types) {
            street_level += 1;
            continue;
        }
        let Some(location) = result.geometry.as_ref().and_then(|g| g.location.as_ref()) else {
            continue;
        };
        if !valid_coordinates(location.lat, location.lng) {
            continue;
        }
        if let Some(reason) = implausibility(query, &result.formatted_address) {
            rejected.get_or_insert(reason);
            continue;
        }
        let hit = GeocodeHit::new(
            location.lat,
            location.lng,
            &result.formatted_address,
            confidence_for_types(&result.types),
            PROVIDER,
        );
        return ProviderLookup::found(
            LookupAttempt::new(PROVIDER, query, LookupOutcome::Success).with_count(results.len()),
            hit,
        );
    }

    let attempt = if let Some(reason) = rejected {
        LookupAttempt::new(PROVIDER, query, LookupOutcome::ImplausibleResult).with_error(reason)
    } else if street_level == results.len() {
        LookupAttempt::new(PROVIDER, query, LookupOutcome::ImplausibleResult)
            .with_error("only street-level results")
    } else {
        LookupAttempt::new(PROVIDER, query, LookupOutcome::InvalidCoordinates)
            .with_error("no result with usable coordinates")
    };
    ProviderLookup::failed(attempt.with_count(results.len()))
}

fn is_street_level(types: &[String]) -> bool {
    types.iter().any(|t| STREET_TYPES.contains(&t.as_str()))
}

/// 1.0 for named features, 0.5 for administrative areas, 0.3 otherwise.
fn confidence_for_types(types: &[String]) -> f64 {
    let has_any = |set: &[&str]| types.iter().any(|t| set.contains(&t.as_str()));
    if has_any(EXACT_TYPES) {
        1.0
    } else if has_any(AREA_TYPES) {
        0.5
    } else {
        0.3
    }
}
