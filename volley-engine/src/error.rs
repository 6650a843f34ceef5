//! Error types for test execution

use thiserror::Error;
use volley_http::HttpError;

/// Result alias used across the engine
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: HttpError,
    },

    #[error("Step '{step}' body could not be encoded: {source}")]
    BodyEncoding {
        step: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP client setup failed: {0}")]
    ClientSetup(#[source] HttpError),

    #[error("Invalid execution state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
