use firesite_zones::{
    find_zone, parse_zone_feed, polygon_centroid, FeedOptions, GeoPoint, GeoPolygonIndex,
};
use serde_json::json;

fn square(cx: f64, cy: f64, half: f64) -> serde_json::Value {
    json!([
        [cx - half, cy - half],
        [cx + half, cy - half],
        [cx + half, cy + half],
        [cx - half, cy + half],
        [cx - half, cy - half]
    ])
}

fn fixture_feed() -> String {
    json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "SOUTHERN_RANGES",
                "properties": { "name": "Southern Ranges" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [square(149.57, -35.89, 0.5), square(149.57, -35.89, 0.1)]
                }
            },
            {
                "type": "Feature",
                "id": "GREATER_HUNTER",
                "properties": { "name": "Greater Hunter" },
                "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [[square(151.0, -32.5, 0.5)], [square(152.5, -32.5, 0.25)]]
                }
            }
        ]
    })
    .to_string()
}

#[test]
fn feed_points_resolve_to_zones() {
    let zones = parse_zone_feed(&fixture_feed(), &FeedOptions::default()).unwrap();
    let index = GeoPolygonIndex::new(zones);

    assert_eq!(
        index.find_zone(GeoPoint::new(-35.5, 149.5)),
        Some("SOUTHERN_RANGES")
    );
    // Inside the hole.
    assert_eq!(index.find_zone(GeoPoint::new(-35.89, 149.57)), None);
    // On the hole's edge counts as inside the zone.
    assert_eq!(
        index.find_zone(GeoPoint::new(-35.79, 149.57)),
        Some("SOUTHERN_RANGES")
    );
    // Second constituent polygon of the multipolygon.
    assert_eq!(
        index.find_zone(GeoPoint::new(-32.5, 152.5)),
        Some("GREATER_HUNTER")
    );
    assert_eq!(index.find_zone(GeoPoint::new(-32.5, 151.9)), None);
}

#[test]
fn vertex_of_outer_ring_is_inside() {
    let zones = parse_zone_feed(&fixture_feed(), &FeedOptions::default()).unwrap();
    assert_eq!(
        find_zone(GeoPoint::new(-36.39, 149.07), &zones),
        Some("SOUTHERN_RANGES")
    );
}

#[test]
fn bounding_box_rejects_before_ring_test() {
    let mut zones = parse_zone_feed(&fixture_feed(), &FeedOptions::default()).unwrap();
    let point = GeoPoint::new(-35.5, 149.5);
    assert_eq!(find_zone(point, &zones), Some("SOUTHERN_RANGES"));

    // Shrink the cached bounds away from the point; the ring still contains
    // it, so a miss proves the pre-filter ran first.
    zones[0].bounds.max_lat = -35.95;
    assert_eq!(find_zone(point, &zones), None);
}

#[test]
fn centroid_of_fixture_ring_resolves_back_to_its_zone() {
    let zones = parse_zone_feed(&fixture_feed(), &FeedOptions::default()).unwrap();
    let firesite_zones::AreaGeometry::MultiPolygon(polygons) = &zones[1].geometry else {
        panic!("expected multipolygon");
    };
    let centroid = polygon_centroid(&polygons[0]).unwrap();
    assert!((centroid.latitude + 32.5).abs() < 1e-9);
    assert!((centroid.longitude - 151.0).abs() < 1e-9);
    assert_eq!(find_zone(centroid, &zones), Some("GREATER_HUNTER"));
}
