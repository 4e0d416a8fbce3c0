use reqwest::StatusCode;
use thiserror::Error;

/// The only failure the pagers ever see from the catalog.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("catalog request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("catalog returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed catalog payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for FetchFailure {
    fn from(err: serde_json::Error) -> Self {
        FetchFailure::Malformed(err.to_string())
    }
}

impl FetchFailure {
    pub fn malformed(msg: impl Into<String>) -> Self {
        FetchFailure::Malformed(msg.into())
    }
}
