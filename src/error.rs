use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run. Source lookups never produce these; see [`SourceError`].
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("progress file {path:?} is corrupt: {reason}")]
    CorruptProgress { path: PathBuf, reason: String },

    #[error("progress file {path:?} has schema version {found}, newest supported is {supported}")]
    UnsupportedProgressVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("invalid input {path:?}: {reason}")]
    InvalidInput { path: PathBuf, reason: String },

    #[error("invalid pattern: {0}")]
    Pattern(String),

    #[error("invalid configuration for {key}: {reason}")]
    Config { key: String, reason: String },
}

/// A failed lookup against one external source. The resolver swallows these
/// and moves on to the next source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("could not build url: {0}")]
    Url(#[from] url::ParseError),

    #[error("unparseable response: {0}")]
    Parse(String),
}

pub type Result<T, E = EnrichError> = std::result::Result<T, E>;
