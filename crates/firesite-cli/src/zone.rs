//! `zone`: maps a coordinate to its fire-weather zone.

use std::path::Path;

use anyhow::Context;
use firesite_geocode::types::valid_coordinates;
use firesite_zones::{parse_zone_feed, FeedOptions, GeoPoint, GeoPolygonIndex};

pub(crate) fn run_zone(
    feed: &Path,
    options: FeedOptions,
    latitude: f64,
    longitude: f64,
) -> anyhow::Result<()> {
    anyhow::ensure!(
        valid_coordinates(latitude, longitude),
        "coordinates out of range: {latitude}, {longitude}"
    );

    let text = std::fs::read_to_string(feed)
        .with_context(|| format!("reading zone feed {}", feed.display()))?;
    let index = GeoPolygonIndex::new(parse_zone_feed(&text, &options)?);
    tracing::debug!(zones = index.len(), "zone feed loaded");

    let point = GeoPoint::new(latitude, longitude);
    let Some(zone_id) = index.find_zone(point) else {
        println!("no zone contains {latitude}, {longitude}");
        return Ok(());
    };
    let name = index.get(zone_id).map_or(zone_id, |z| z.name.as_str());
    println!("{zone_id}\t{name}");

    let overlapping: Vec<&str> = index
        .find_zones(point)
        .into_iter()
        .map(|z| z.id.as_str())
        .filter(|id| *id != zone_id)
        .collect();
    if !overlapping.is_empty() {
        println!("also inside: {}", overlapping.join(", "));
    }
    Ok(())
}
