//! Planar geometry over `[longitude, latitude]` rings.
//!
//! Rings follow GeoJSON conventions: closed (first point repeated last) and
//! stored as `[lon, lat]` pairs. Boundary points count as inside.

use serde::Serialize;

/// Tolerance for the on-segment test, in degrees (~1 cm).
const EDGE_EPSILON: f64 = 1e-9;

pub type Ring = Vec<[f64; 2]>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Bounds enclosing every point of every ring, or `None` if there are none.
    #[must_use]
    pub fn from_rings<'a, I>(rings: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Ring>,
    {
        let mut bounds: Option<Self> = None;
        for [lon, lat] in rings.into_iter().flatten().copied() {
            let b = bounds.get_or_insert(Self {
                min_lat: lat,
                max_lat: lat,
                min_lon: lon,
                max_lon: lon,
            });
            b.min_lat = b.min_lat.min(lat);
            b.max_lat = b.max_lat.max(lat);
            b.min_lon = b.min_lon.min(lon);
            b.max_lon = b.max_lon.max(lon);
        }
        bounds
    }

    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.latitude >= self.min_lat - EDGE_EPSILON
            && point.latitude <= self.max_lat + EDGE_EPSILON
            && point.longitude >= self.min_lon - EDGE_EPSILON
            && point.longitude <= self.max_lon + EDGE_EPSILON
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RingPosition {
    Inside,
    Boundary,
    Outside,
}

/// Even-odd ray cast with an explicit boundary check ahead of it.
pub(crate) fn locate_in_ring(point: GeoPoint, ring: &[[f64; 2]]) -> RingPosition {
    let (x, y) = (point.longitude, point.latitude);
    if ring.len() < 2 {
        return RingPosition::Outside;
    }

    for edge in ring.windows(2) {
        if on_segment([x, y], edge[0], edge[1]) {
            return RingPosition::Boundary;
        }
    }

    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    if inside {
        RingPosition::Inside
    } else {
        RingPosition::Outside
    }
}

fn on_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> bool {
    let cross = (p[0] - a[0]) * (b[1] - a[1]) - (p[1] - a[1]) * (b[0] - a[0]);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    let dot = (p[0] - a[0]) * (b[0] - a[0]) + (p[1] - a[1]) * (b[1] - a[1]);
    if dot < -EDGE_EPSILON {
        return false;
    }
    let len_sq = (b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2);
    dot <= len_sq + EDGE_EPSILON
}

/// Inside the outer ring (index 0) and not strictly inside any hole.
#[must_use]
pub fn polygon_contains(point: GeoPoint, rings: &[Ring]) -> bool {
    let Some((outer, holes)) = rings.split_first() else {
        return false;
    };
    if locate_in_ring(point, outer) == RingPosition::Outside {
        return false;
    }
    !holes
        .iter()
        .any(|hole| locate_in_ring(point, hole) == RingPosition::Inside)
}

fn signed_area(ring: &[[f64; 2]]) -> f64 {
    ring.windows(2)
        .map(|w| w[0][0] * w[1][1] - w[1][0] * w[0][1])
        .sum::<f64>()
        / 2.0
}

fn ring_centroid(ring: &[[f64; 2]]) -> Option<GeoPoint> {
    let origin = *ring.first()?;
    // Shift to the first vertex so large absolute coordinates do not swamp
    // the small cross products.
    let local: Vec<[f64; 2]> = ring
        .iter()
        .map(|p| [p[0] - origin[0], p[1] - origin[1]])
        .collect();

    let area = signed_area(&local);
    if area.abs() > f64::EPSILON {
        let (mut cx, mut cy) = (0.0, 0.0);
        for w in local.windows(2) {
            let cross = w[0][0] * w[1][1] - w[1][0] * w[0][1];
            cx += (w[0][0] + w[1][0]) * cross;
            cy += (w[0][1] + w[1][1]) * cross;
        }
        return Some(GeoPoint::new(
            origin[1] + cy / (6.0 * area),
            origin[0] + cx / (6.0 * area),
        ));
    }

    // Degenerate ring: average the distinct vertices.
    let vertices = if ring.len() > 1 && ring.first() == ring.last() {
        &ring[..ring.len() - 1]
    } else {
        ring
    };
    #[allow(clippy::cast_precision_loss)]
    let n = vertices.len() as f64;
    let (sx, sy) = vertices
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    Some(GeoPoint::new(sy / n, sx / n))
}

/// Centroid of the largest ring (by absolute area) among `rings`.
#[must_use]
pub fn polygon_centroid(rings: &[Ring]) -> Option<GeoPoint> {
    rings
        .iter()
        .filter(|r| !r.is_empty())
        .max_by(|a, b| signed_area(a).abs().total_cmp(&signed_area(b).abs()))
        .and_then(|r| ring_centroid(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f64, cy: f64, half: f64) -> Ring {
        vec![
            [cx - half, cy - half],
            [cx + half, cy - half],
            [cx + half, cy + half],
            [cx - half, cy + half],
            [cx - half, cy - half],
        ]
    }

    #[test]
    fn centroid_of_square_is_inside() {
        let ring = square(149.57, -35.89, 0.05);
        assert!(polygon_contains(GeoPoint::new(-35.89, 149.57), &[ring]));
    }

    #[test]
    fn point_outside_square() {
        let ring = square(0.0, 0.0, 1.0);
        assert!(!polygon_contains(GeoPoint::new(0.0, 2.0), &[ring]));
    }

    #[test]
    fn vertex_and_edge_points_are_inside() {
        let ring = square(0.0, 0.0, 1.0);
        assert!(polygon_contains(GeoPoint::new(-1.0, -1.0), &[ring.clone()]));
        assert!(polygon_contains(GeoPoint::new(0.0, 1.0), &[ring.clone()]));
        assert!(polygon_contains(GeoPoint::new(1.0, 0.3), &[ring]));
    }

    #[test]
    fn hole_excludes_interior_but_not_its_edge() {
        let rings = vec![square(0.0, 0.0, 2.0), square(0.0, 0.0, 0.5)];
        assert!(!polygon_contains(GeoPoint::new(0.0, 0.0), &rings));
        assert!(polygon_contains(GeoPoint::new(0.0, 0.5), &rings));
        assert!(polygon_contains(GeoPoint::new(1.5, 1.5), &rings));
    }

    #[test]
    fn concave_ring_notch_is_outside() {
        // U shape opening upwards.
        let ring = vec![
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0],
            [0.0, 0.0],
        ];
        assert!(!polygon_contains(GeoPoint::new(2.0, 1.5), &[ring.clone()]));
        assert!(polygon_contains(GeoPoint::new(2.0, 0.5), &[ring]));
    }

    #[test]
    fn bounds_cover_all_points() {
        let rings = vec![square(10.0, 20.0, 1.0)];
        let bounds = Bounds::from_rings(&rings).unwrap();
        assert!((bounds.min_lon - 9.0).abs() < 1e-12);
        assert!((bounds.max_lat - 21.0).abs() < 1e-12);
        assert!(bounds.contains(GeoPoint::new(20.0, 10.0)));
        assert!(!bounds.contains(GeoPoint::new(22.0, 10.0)));
    }

    #[test]
    fn centroid_of_square_matches_center() {
        let c = polygon_centroid(&[square(149.57, -35.89, 0.05)]).unwrap();
        assert!((c.latitude - -35.89).abs() < 1e-9);
        assert!((c.longitude - 149.57).abs() < 1e-9);
    }

    #[test]
    fn centroid_uses_largest_ring() {
        let c = polygon_centroid(&[square(0.0, 0.0, 0.1), square(5.0, 5.0, 2.0)]).unwrap();
        assert!((c.longitude - 5.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_ring_centroid_is_vertex_mean() {
        let line = vec![[0.0, 0.0], [2.0, 2.0], [0.0, 0.0]];
        let c = polygon_centroid(&[line]).unwrap();
        assert!((c.longitude - 1.0).abs() < 1e-9);
        assert!((c.latitude - 1.0).abs() < 1e-9);
    }
}
