use thiserror::Error;

/// Errors raised by the geocode cache's backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The store detected an inconsistency it cannot read past.
    #[error("store is corrupt: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store task failed: {0}")]
    Task(String),
}

impl StoreError {
    /// Whether the failure means the backing files are unusable and should be
    /// recreated rather than retried as-is.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        use rusqlite::ErrorCode;
        match self {
            StoreError::Corrupt(_) => true,
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                ErrorCode::ReadOnly
                    | ErrorCode::DatabaseCorrupt
                    | ErrorCode::NotADatabase
                    | ErrorCode::CannotOpen
                    | ErrorCode::SystemIoFailure
            ),
            StoreError::Sqlite(_)
            | StoreError::Io { .. }
            | StoreError::Poisoned
            | StoreError::Task(_) => false,
        }
    }
}

/// Errors returned by geocode providers, the cache, and the resolver.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// The provider answered 2xx but reported an error in its body.
    #[error("provider error: {0}")]
    Api(String),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Credentials or endpoint not configured; never retried.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// A cache write failed for a reason other than corruption.
    #[error("geocode cache error: {0}")]
    Cache(#[source] StoreError),

    /// A cache write still failed after the store was recreated.
    #[error("geocode cache storage corrupted: {0}")]
    StorageCorruption(#[source] StoreError),
}
