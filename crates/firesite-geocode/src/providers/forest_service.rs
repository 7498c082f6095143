//! Authoritative forest-boundary polygon service (ArcGIS feature layer).
//!
//! Features are matched by case-insensitive name containment and resolved to
//! the area-weighted centroid of their largest ring.

use firesite_matching::normalize_name;
use firesite_zones::{polygon_centroid, Ring};
use reqwest::{Client, Url};
use serde_json::Value;

use super::{failed_attempt, get_json, parse_base_url, ProviderLookup, RetryPolicy};
use crate::error::GeocodeError;
use crate::query::{strip_forest_suffix, FOREST_SUFFIX};
use crate::retry::retry_with_backoff;
use crate::types::{valid_coordinates, GeocodeHit, GeocodeProvider, LookupAttempt, LookupOutcome};

const PROVIDER: GeocodeProvider = GeocodeProvider::ForestService;
const NAME_FIELD: &str = "SFName";
const ID_FIELD: &str = "SFNo";

/// One named boundary, with every ring the service returned for its id.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundaryFeature {
    pub id: String,
    pub name: String,
    pub rings: Vec<Ring>,
}

enum Selection {
    Unique(BoundaryFeature),
    Ambiguous(usize),
    Empty,
}

pub struct ForestServiceClient {
    client: Client,
    query_url: Option<Url>,
    retry: RetryPolicy,
}

impl ForestServiceClient {
    /// `query_url` is the feature layer's `/query` endpoint. `None` leaves the
    /// provider unavailable.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::InvalidBaseUrl`] if `query_url` does not parse.
    pub fn new(
        client: Client,
        query_url: Option<&str>,
        retry: RetryPolicy,
    ) -> Result<Self, GeocodeError> {
        let query_url = query_url.map(parse_base_url).transpose()?;
        Ok(Self {
            client,
            query_url,
            retry,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.query_url.is_some()
    }

    pub async fn lookup(&self, query: &str) -> ProviderLookup {
        let Some(base) = &self.query_url else {
            let err = GeocodeError::ProviderUnavailable("forest service URL not configured".into());
            return ProviderLookup::failed(failed_attempt(PROVIDER, query, &err));
        };

        let search = strip_forest_suffix(query);
        let url = build_query_url(base, search);
        let result = retry_with_backoff(
            PROVIDER.as_str(),
            self.retry.max_retries,
            self.retry.backoff_base_ms,
            move || {
                let url = url.clone();
                async move {
                    let body = get_json(&self.client, url, "forest service query").await?;
                    parse_features(&body)
                }
            },
        )
        .await;

        let features = match result {
            Ok(features) => features,
            Err(err) => return ProviderLookup::failed(failed_attempt(PROVIDER, query, &err)),
        };

        let feature = match select_feature(features, query) {
            Selection::Unique(feature) => feature,
            Selection::Empty => {
                return ProviderLookup::failed(
                    LookupAttempt::new(PROVIDER, query, LookupOutcome::EmptyResult).with_count(0),
                )
            }
            Selection::Ambiguous(count) => {
                tracing::debug!(query, count, "forest service match is ambiguous");
                return ProviderLookup::failed(
                    LookupAttempt::new(PROVIDER, query, LookupOutcome::MultipleMatches)
                        .with_count(count)
                        .with_error(format!("{count} distinct forests match \"{search}\"")),
                );
            }
        };

        let centroid = polygon_centroid(&feature.rings)
            .filter(|c| valid_coordinates(c.latitude, c.longitude));
        let Some(centroid) = centroid else {
            return ProviderLookup::failed(
                LookupAttempt::new(PROVIDER, query, LookupOutcome::InvalidCoordinates)
                    .with_count(1)
                    .with_error(format!("no usable geometry for forest {}", feature.id)),
            );
        };

        let display_name = format!("{} {FOREST_SUFFIX}", title_case(&feature.name));
        let hit = GeocodeHit::new(
            centroid.latitude,
            centroid.longitude,
            &display_name,
            1.0,
            PROVIDER,
        );
        ProviderLookup::found(
            LookupAttempt::new(PROVIDER, query, LookupOutcome::Success).with_count(1),
            hit,
        )
    }
}

/// Feature-layer query URL for names containing `search`.
pub(crate) fn build_query_url(base: &Url, search: &str) -> Url {
    let needle = search.trim().to_uppercase().replace('\'', "''");
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("where", &format!("UPPER({NAME_FIELD}) LIKE '%{needle}%'"))
        .append_pair("outFields", &format!("{NAME_FIELD},{ID_FIELD}"))
        .append_pair("returnGeometry", "true")
        .append_pair("outSR", "4326")
        .append_pair("f", "json");
    url
}

/// Validates the feature-layer response, merging features that share an id.
pub(crate) fn parse_features(body: &Value) -> Result<Vec<BoundaryFeature>, GeocodeError> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(GeocodeError::Api(message.to_string()));
    }
    let Some(features) = body.get("features").and_then(Value::as_array) else {
        return Err(GeocodeError::Api("response has no features array".into()));
    };

    let mut merged: Vec<BoundaryFeature> = Vec::new();
    for feature in features {
        let attributes = feature.get("attributes");
        let Some(name) = attributes
            .and_then(|a| a.get(NAME_FIELD))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
        else {
            continue;
        };
        let id = attributes
            .and_then(|a| a.get(ID_FIELD))
            .and_then(value_as_id)
            .unwrap_or_else(|| normalize_name(name));
        let rings = feature
            .get("geometry")
            .and_then(|g| g.get("rings"))
            .and_then(Value::as_array)
            .map(|rings| rings.iter().filter_map(parse_ring).collect::<Vec<_>>())
            .unwrap_or_default();

        match merged.iter_mut().find(|f| f.id == id) {
            Some(existing) => existing.rings.extend(rings),
            None => merged.push(BoundaryFeature {
                id,
                name: name.to_string(),
                rings,
            }),
        }
    }
    Ok(merged)
}

/// Unique feature, or the single exact-name match among several.
fn select_feature(mut features: Vec<BoundaryFeature>, query: &str) -> Selection {
    match features.len() {
        0 => Selection::Empty,
        1 => Selection::Unique(features.remove(0)),
        count => {
            let key = normalize_name(query);
            let mut exact: Vec<BoundaryFeature> = features
                .into_iter()
                .filter(|f| normalize_name(&f.name) == key)
                .collect();
            if exact.len() == 1 {
                Selection::Unique(exact.remove(0))
            } else {
                Selection::Ambiguous(count)
            }
        }
    }
}

fn parse_ring(value: &Value) -> Option<Ring> {
    let ring: Ring = value
        .as_array()?
        .iter()
        .filter_map(|point| {
            let pair = point.as_array()?;
            Some([pair.first()?.as_f64()?, pair.get(1)?.as_f64()?])
        })
        .collect();
    (ring.len() >= 3).then_some(ring)
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
