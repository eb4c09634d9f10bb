//! Error types shared by the analysis, rendering and storage stages.
//!
//! Every variant is terminal for the run it occurs in: nothing here is
//! retried, and no partial result is produced after an error.

/// Error type for a single analysis or collection run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source text (local file or stored object) does not exist.
    #[error("input not found: {0}")]
    InputMissing(String),

    /// A required setting (e.g. the bucket name) was not provided.
    #[error("configuration missing: {0} is not set")]
    ConfigMissing(&'static str),

    /// The configuration file was unreadable or rejected.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Chart drawing or rasterization failed.
    #[error("chart rendering failed: {0}")]
    Render(String),

    /// The object store rejected a read or write.
    #[error("object storage failed: {0}")]
    Storage(#[from] object_store::Error),

    /// Fetching a headline source failed.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Local filesystem failure.
    #[error("i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization failed.
    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Status code carried in the report envelope for this error.
    pub fn code(&self) -> u16 {
        match self {
            Error::InputMissing(_) => 404,
            Error::Config(_) => 400,
            _ => 500,
        }
    }
}

/// Result type alias for analysis and storage operations.
pub type Result<T> = std::result::Result<T, Error>;
