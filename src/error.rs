use reqwest::StatusCode;
use thiserror::Error;

/// Rejected arguments. Raised before any request leaves the process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameter `{0}`")]
    MissingParam(&'static str),

    #[error("invalid currency pair string: {0:?}")]
    InvalidPair(String),

    #[error("currency pair parameter `{0}` must be a string")]
    PairNotString(&'static str),

    #[error("path parameter `{0}` cannot be `.` or `..`")]
    DotSegment(&'static str),

    #[error("parameter `{0}` must be a string, number or boolean")]
    NotScalar(&'static str),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response body: {source} body => {body}")]
    Json {
        source: serde_json::Error,
        body: String,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

impl Error {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
