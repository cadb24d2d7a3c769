use thiserror::Error;

/// Failure of a single upstream fetch
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Request rejected, timed out or answered with a non-success status
    #[error("network failure: {0}")]
    Network(String),

    /// Body did not match the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        FetchError::MalformedResponse(msg.into())
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FetchError::MalformedResponse(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

impl From<simd_json::Error> for FetchError {
    fn from(err: simd_json::Error) -> Self {
        FetchError::MalformedResponse(err.to_string())
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;
