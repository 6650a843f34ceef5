//! HTTP error types

use crate::types::HttpMethodError;

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(#[from] HttpMethodError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Invalid value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("Failed to read response body (status {status}): {message}")]
    BodyRead { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HttpError {
    /// Whether the request failed before anything was sent on the wire
    pub fn is_pre_flight(&self) -> bool {
        matches!(
            self,
            HttpError::InvalidMethod(_)
                | HttpError::InvalidUrl(_)
                | HttpError::InvalidHeaderName(_)
                | HttpError::InvalidHeaderValue(_)
                | HttpError::ConfigError(_)
        )
    }

    /// Whether the call was cut off by the client timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::NetworkError(e) if e.is_timeout())
    }

    /// Status code that was received before the failure, 0 if none
    pub fn status_code(&self) -> u16 {
        match self {
            HttpError::BodyRead { status, .. } => *status,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pre_flight_classification() {
        assert!(HttpError::InvalidUrl("::".into()).is_pre_flight());
        assert!(HttpError::InvalidHeaderName("bad header".into()).is_pre_flight());
        assert!(HttpError::InvalidMethod(HttpMethodError::InvalidMethod("BREW".into())).is_pre_flight());

        let body = HttpError::BodyRead {
            status: 200,
            message: "connection reset".into(),
        };
        assert!(!body.is_pre_flight());
        assert_eq!(body.status_code(), 200);
        assert_eq!(HttpError::InvalidUrl("x".into()).status_code(), 0);
    }
}
