use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrendsError {
    #[error("Region code not valid: {0} (expected one of {1})")]
    InvalidRegion(String, String),

    #[error("YouTube API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Storage error {status}: {message}")]
    Storage { status: u16, message: String },

    #[error("Invalid storage URL {url}: {reason}")]
    InvalidStorageUrl { url: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}
