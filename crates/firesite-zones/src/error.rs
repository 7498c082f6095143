use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("zone feed is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("zone feed is not a GeoJSON FeatureCollection: {0}")]
    NotFeatureCollection(String),
}
