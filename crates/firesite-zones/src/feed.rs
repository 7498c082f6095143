//! Zone-polygon feed ingestion.
//!
//! The feed is GeoJSON-like: a `FeatureCollection` whose features carry an id,
//! a name property, and `Polygon` or `MultiPolygon` geometry. Every value is
//! validated field by field; malformed features are skipped with a warning
//! rather than failing the whole feed. Rings with fewer than four points are
//! discarded here so queries never see them.

use serde::Serialize;
use serde_json::Value;

use crate::error::FeedError;
use crate::geometry::{polygon_contains, Bounds, GeoPoint, Ring};

const MIN_RING_POINTS: usize = 4;

/// Which feature properties carry the zone id and display name.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Used when the feature has no top-level `id`.
    pub id_property: String,
    pub name_property: String,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            id_property: "id".to_string(),
            name_property: "name".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum AreaGeometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl AreaGeometry {
    #[must_use]
    pub fn geometry_type(&self) -> &'static str {
        match self {
            AreaGeometry::Polygon(_) => "Polygon",
            AreaGeometry::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Any constituent polygon contains the point.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        match self {
            AreaGeometry::Polygon(rings) => polygon_contains(point, rings),
            AreaGeometry::MultiPolygon(polygons) => {
                polygons.iter().any(|rings| polygon_contains(point, rings))
            }
        }
    }

    fn rings(&self) -> Vec<&Ring> {
        match self {
            AreaGeometry::Polygon(rings) => rings.iter().collect(),
            AreaGeometry::MultiPolygon(polygons) => polygons.iter().flatten().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoArea {
    pub id: String,
    pub name: String,
    pub geometry: AreaGeometry,
    pub bounds: Bounds,
}

impl GeoArea {
    /// Builds an area, computing its bounds. `None` if the geometry has no points.
    #[must_use]
    pub fn new(id: &str, name: &str, geometry: AreaGeometry) -> Option<Self> {
        let bounds = Bounds::from_rings(geometry.rings())?;
        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            geometry,
            bounds,
        })
    }
}

/// Parses the zone feed into areas, rebuilding the full set from scratch.
///
/// # Errors
///
/// Returns [`FeedError::Json`] if `text` is not JSON, or
/// [`FeedError::NotFeatureCollection`] if it lacks a `features` array.
pub fn parse_zone_feed(text: &str, options: &FeedOptions) -> Result<Vec<GeoArea>, FeedError> {
    let root: Value = serde_json::from_str(text)?;
    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| FeedError::NotFeatureCollection("missing `features` array".to_string()))?;

    let mut areas = Vec::with_capacity(features.len());
    for (idx, feature) in features.iter().enumerate() {
        match parse_feature(feature, options) {
            Some(area) => areas.push(area),
            None => tracing::warn!(index = idx, "skipping unusable zone feature"),
        }
    }

    tracing::debug!(
        total = features.len(),
        kept = areas.len(),
        "zone feed ingested"
    );
    Ok(areas)
}

fn parse_feature(feature: &Value, options: &FeedOptions) -> Option<GeoArea> {
    let properties = feature.get("properties");
    let id = feature
        .get("id")
        .and_then(value_as_string)
        .or_else(|| {
            properties
                .and_then(|p| p.get(&options.id_property))
                .and_then(value_as_string)
        })?;
    let name = properties
        .and_then(|p| p.get(&options.name_property))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| id.clone(), str::to_string);

    let geometry = feature.get("geometry")?;
    let coordinates = geometry.get("coordinates")?.as_array()?;
    let parsed = match geometry.get("type").and_then(Value::as_str)? {
        "Polygon" => parse_polygon(coordinates).map(AreaGeometry::Polygon),
        "MultiPolygon" => {
            let polygons: Vec<Vec<Ring>> = coordinates
                .iter()
                .filter_map(Value::as_array)
                .filter_map(|p| parse_polygon(p))
                .collect();
            (!polygons.is_empty()).then_some(AreaGeometry::MultiPolygon(polygons))
        }
        other => {
            tracing::debug!(zone = %id, geometry_type = other, "unsupported geometry type");
            None
        }
    }?;

    GeoArea::new(&id, &name, parsed)
}

/// Parses one polygon's rings. The polygon is dropped if its outer ring is unusable.
fn parse_polygon(rings: &[Value]) -> Option<Vec<Ring>> {
    let mut parsed = Vec::with_capacity(rings.len());
    for (idx, ring) in rings.iter().enumerate() {
        match ring.as_array().and_then(|r| parse_ring(r)) {
            Some(ring) => parsed.push(ring),
            None if idx == 0 => return None,
            None => tracing::debug!(ring = idx, "discarding short or malformed hole ring"),
        }
    }
    (!parsed.is_empty()).then_some(parsed)
}

fn parse_ring(points: &[Value]) -> Option<Ring> {
    if points.len() < MIN_RING_POINTS {
        return None;
    }
    points
        .iter()
        .map(|p| {
            let pair = p.as_array()?;
            let lon = pair.first()?.as_f64()?;
            let lat = pair.get(1)?.as_f64()?;
            (lon.is_finite() && lat.is_finite()).then_some([lon, lat])
        })
        .collect()
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
