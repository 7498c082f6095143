use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Decimal places kept on every cached coordinate (~11 cm).
pub const COORDINATE_PRECISION: i32 = 6;

/// Rounds a coordinate to [`COORDINATE_PRECISION`] decimal places.
#[must_use]
pub fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_PRECISION);
    (value * scale).round() / scale
}

/// Finite and within WGS84 latitude/longitude ranges.
#[must_use]
pub fn valid_coordinates(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// Providers in cascade priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeProvider {
    /// Official forest-boundary polygon service.
    ForestService,
    Google,
    Nominatim,
}

impl GeocodeProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GeocodeProvider::ForestService => "forest_service",
            GeocodeProvider::Google => "google",
            GeocodeProvider::Nominatim => "nominatim",
        }
    }
}

impl fmt::Display for GeocodeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A resolved coordinate as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeHit {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub confidence: f64,
    pub provider: GeocodeProvider,
    pub updated_at: DateTime<Utc>,
}

impl GeocodeHit {
    /// Builds a hit stamped now, with coordinates rounded and confidence clamped to `[0, 1]`.
    #[must_use]
    pub fn new(
        latitude: f64,
        longitude: f64,
        display_name: &str,
        confidence: f64,
        provider: GeocodeProvider,
    ) -> Self {
        Self {
            latitude: round_coordinate(latitude),
            longitude: round_coordinate(longitude),
            display_name: display_name.trim().to_string(),
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
            provider,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LookupOutcome {
    Success,
    CacheHit,
    EmptyResult,
    InvalidCoordinates,
    ProviderUnavailable,
    RequestFailed,
    HttpError,
    ImplausibleResult,
    MultipleMatches,
    LimitReached,
}

impl LookupOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LookupOutcome::Success => "SUCCESS",
            LookupOutcome::CacheHit => "CACHE_HIT",
            LookupOutcome::EmptyResult => "EMPTY_RESULT",
            LookupOutcome::InvalidCoordinates => "INVALID_COORDINATES",
            LookupOutcome::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            LookupOutcome::RequestFailed => "REQUEST_FAILED",
            LookupOutcome::HttpError => "HTTP_ERROR",
            LookupOutcome::ImplausibleResult => "IMPLAUSIBLE_RESULT",
            LookupOutcome::MultipleMatches => "MULTIPLE_MATCHES",
            LookupOutcome::LimitReached => "LIMIT_REACHED",
        }
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One provider/candidate try. Appended to the trail, never rewritten once
/// the cascade moves on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupAttempt {
    pub provider: GeocodeProvider,
    pub query: String,
    pub outcome: LookupOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LookupAttempt {
    #[must_use]
    pub fn new(provider: GeocodeProvider, query: &str, outcome: LookupOutcome) -> Self {
        Self {
            provider,
            query: query.to_string(),
            outcome,
            http_status: None,
            result_count: None,
            error_message: None,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.result_count = Some(count);
        self
    }

    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Result of resolving one forest. Coordinates are `None` when every
/// candidate and provider failed; `attempts` and `warnings` explain why.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ForestCoordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub display_name: Option<String>,
    pub confidence: Option<f64>,
    pub provider: Option<GeocodeProvider>,
    pub attempts: Vec<LookupAttempt>,
    pub warnings: Vec<String>,
}

impl ForestCoordinates {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub(crate) fn apply_hit(&mut self, hit: &GeocodeHit) {
        self.latitude = Some(hit.latitude);
        self.longitude = Some(hit.longitude);
        self.display_name = Some(hit.display_name.clone());
        self.confidence = Some(hit.confidence);
        self.provider = Some(hit.provider);
    }
}

/// One forest to resolve in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestQuery {
    pub name: String,
    /// Alternative spelling from the facilities directory, if it differs.
    pub hint: Option<String>,
}

impl ForestQuery {
    #[must_use]
    pub fn new(name: &str, hint: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            hint: hint.map(str::to_string),
        }
    }
}
