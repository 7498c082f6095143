//! Point-to-zone lookup.

use crate::feed::GeoArea;
use crate::geometry::GeoPoint;

/// Id of the first zone, in feed order, that contains `point`.
///
/// Zones are expected to be disjoint. When more than one contains the point
/// the first still wins, and the overlap is logged so bad upstream data is
/// visible.
#[must_use]
pub fn find_zone(point: GeoPoint, zones: &[GeoArea]) -> Option<&str> {
    let mut matches = containing(point, zones);
    let first = matches.next()?;
    let overlapping: Vec<&str> = matches.map(|z| z.id.as_str()).collect();
    if !overlapping.is_empty() {
        tracing::warn!(
            latitude = point.latitude,
            longitude = point.longitude,
            chosen = %first.id,
            overlapping = ?overlapping,
            "point falls inside overlapping zones"
        );
    }
    Some(first.id.as_str())
}

/// Every zone containing `point`, in feed order.
#[must_use]
pub fn find_zones(point: GeoPoint, zones: &[GeoArea]) -> Vec<&GeoArea> {
    containing(point, zones).collect()
}

fn containing(point: GeoPoint, zones: &[GeoArea]) -> impl Iterator<Item = &GeoArea> {
    zones
        .iter()
        .filter(move |z| z.bounds.contains(point))
        .filter(move |z| z.geometry.contains(point))
}

/// Zone set from one feed ingestion. Replaced wholesale on each refresh.
#[derive(Debug, Clone, Default)]
pub struct GeoPolygonIndex {
    zones: Vec<GeoArea>,
}

impl GeoPolygonIndex {
    #[must_use]
    pub fn new(zones: Vec<GeoArea>) -> Self {
        Self { zones }
    }

    #[must_use]
    pub fn zones(&self) -> &[GeoArea] {
        &self.zones
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GeoArea> {
        self.zones.iter().find(|z| z.id == id)
    }

    #[must_use]
    pub fn find_zone(&self, point: GeoPoint) -> Option<&str> {
        find_zone(point, &self.zones)
    }

    #[must_use]
    pub fn find_zones(&self, point: GeoPoint) -> Vec<&GeoArea> {
        find_zones(point, &self.zones)
    }

    /// Swaps in a freshly ingested zone set.
    pub fn replace(&mut self, zones: Vec<GeoArea>) {
        self.zones = zones;
    }
}
