pub mod app_config;
pub mod config;
pub mod sources;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use sources::{load_source_lists, SourceForest, SourceLists};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read source list file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse source list file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("source list validation failed: {0}")]
    Validation(String),
}
