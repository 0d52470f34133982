//! Error types for the platform API client

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for platform API calls
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed
    #[error("Request failed: {0}")]
    Transport(#[from] CrateError),

    /// Non-success transport-level status
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// Body is not the expected JSON shape
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Embedded status code reports a failure
    #[error("API error {code}: {message}")]
    Application { code: i64, message: String },

    /// Success envelope without a data payload
    #[error("Response carried no data")]
    MissingData,

    /// Comment document is not well-formed XML
    #[error("Comment document error: {0}")]
    Document(#[from] quick_xml::Error),

    /// Endpoint could not be turned into a URL
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Whether this failure is the platform pushing back on request volume
    pub fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::Status(status) => *status == 412 || *status == 429,
            ApiError::Application { code, .. } => *code == super::ANTI_CRAWL_CODE,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(ApiError::Status(412).is_rate_limited());
        assert!(ApiError::Status(429).is_rate_limited());
        assert!(!ApiError::Status(500).is_rate_limited());
        assert!(
            ApiError::Application {
                code: -412,
                message: "request was banned".to_string()
            }
            .is_rate_limited()
        );
        assert!(
            !ApiError::Application {
                code: -400,
                message: "bad request".to_string()
            }
            .is_rate_limited()
        );
    }
}
