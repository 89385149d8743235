use thiserror::Error;

/// Failures crossing the results-store boundary.
///
/// An empty store is not an error: `get` returns an empty snapshot for it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Payload does not have the snapshot shape; nothing was written.
    #[error("malformed snapshot: {0}")]
    Malformed(String),

    /// Backend could not be reached or failed mid-operation.
    #[error("results store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, StoreError::Malformed(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}
