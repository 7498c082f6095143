//! Fire-weather zone geometry.
//!
//! Ingests the zone-polygon feed into [`GeoArea`]s and maps coordinates to the
//! zone that contains them.

pub mod error;
pub mod feed;
pub mod geometry;
pub mod index;

pub use error::FeedError;
pub use feed::{parse_zone_feed, AreaGeometry, FeedOptions, GeoArea};
pub use geometry::{polygon_centroid, Bounds, GeoPoint, Ring};
pub use index::{find_zone, find_zones, GeoPolygonIndex};
