//! Error classification for remote fetches.

use reqwest::StatusCode;

/// Failure kinds for remote operations.
///
/// Operations react differently to a missing archive (abort that package,
/// keep going) than to a transport failure, so the kind is carried as a
/// typed error instead of a bare message.
#[derive(Debug)]
pub enum FetchError {
    /// The remote returned a non-success status (archive absent, bad slug).
    NotFound(String),
    /// Transport-level failure (DNS, connect, read).
    Network(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotFound(msg) => write!(f, "Not found: {}", msg),
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// Classify a status code into the taxonomy.
    /// Any non-success response counts as NotFound: the remote answered,
    /// the resource just is not there (or not accessible).
    pub fn from_status(status: StatusCode, url: &str) -> Self {
        FetchError::NotFound(format!("HTTP {} for {}", status.as_u16(), url))
    }

    /// Classify a transport error from reqwest.
    pub fn from_transport(error: reqwest::Error) -> Self {
        FetchError::Network(error.to_string())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}
