//! HTTP adapters for the geocoding cascade.
//!
//! Each adapter turns one query into a [`ProviderLookup`]: the attempts it made
//! plus an optional hit. Provider failures are recorded as attempts and never
//! returned as errors.

pub mod forest_service;
pub mod google;
pub mod nominatim;

use reqwest::{Client, Url};
use serde_json::Value;

use crate::error::GeocodeError;
use crate::types::{GeocodeHit, GeocodeProvider, LookupAttempt, LookupOutcome};

pub use forest_service::ForestServiceClient;
pub use google::GoogleGeocoder;
pub use nominatim::NominatimClient;

/// Retry settings shared by every adapter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

/// Attempts made against one provider for one query.
#[derive(Debug, Clone, Default)]
pub struct ProviderLookup {
    pub attempts: Vec<LookupAttempt>,
    pub hit: Option<GeocodeHit>,
}

impl ProviderLookup {
    pub(crate) fn failed(attempt: LookupAttempt) -> Self {
        Self {
            attempts: vec![attempt],
            hit: None,
        }
    }

    pub(crate) fn found(attempt: LookupAttempt, hit: GeocodeHit) -> Self {
        Self {
            attempts: vec![attempt],
            hit: Some(hit),
        }
    }
}

/// Parses `base_url`, rejecting anything that is not absolute http(s).
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, GeocodeError> {
    let url = Url::parse(base_url.trim()).map_err(|e| GeocodeError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GeocodeError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Sends a GET request, maps non-2xx to [`GeocodeError::HttpStatus`], and
/// parses the body as JSON.
pub(crate) async fn get_json(client: &Client, url: Url, context: &str) -> Result<Value, GeocodeError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(GeocodeError::HttpStatus {
            status: status.as_u16(),
            url: redacted(&url),
        });
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

/// URL without its query string, which may carry credentials.
fn redacted(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Converts a provider error into the attempt that records it.
pub(crate) fn failed_attempt(
    provider: GeocodeProvider,
    query: &str,
    err: &GeocodeError,
) -> LookupAttempt {
    let outcome = match err {
        GeocodeError::ProviderUnavailable(_) | GeocodeError::InvalidBaseUrl { .. } => {
            LookupOutcome::ProviderUnavailable
        }
        GeocodeError::HttpStatus { .. } | GeocodeError::Api(_) => LookupOutcome::HttpError,
        GeocodeError::Http(e) if e.status().is_some() => LookupOutcome::HttpError,
        GeocodeError::Http(_)
        | GeocodeError::Deserialize { .. }
        | GeocodeError::Cache(_)
        | GeocodeError::StorageCorruption(_) => LookupOutcome::RequestFailed,
    };
    let mut attempt = LookupAttempt::new(provider, query, outcome).with_error(err.to_string());
    let status = match err {
        GeocodeError::HttpStatus { status, .. } => Some(*status),
        GeocodeError::Http(e) => e.status().map(|s| s.as_u16()),
        _ => None,
    };
    if let Some(status) = status {
        attempt = attempt.with_status(status);
    }
    tracing::debug!(
        provider = %provider,
        query,
        outcome = %attempt.outcome,
        error = %err,
        "geocoder attempt failed"
    );
    attempt
}
