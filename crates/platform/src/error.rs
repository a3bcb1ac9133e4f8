/// Errors returned by platform operations.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The platform answered with a non-2xx status.
    #[error("Platform API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response could not be decoded into the expected shape.
    #[error("Failed to decode platform response: {0}")]
    Decode(String),

    /// The addressed row, object or function does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A failure injected by [`crate::InMemoryPlatform`].
    #[error("Injected failure: {0}")]
    Injected(String),
}

impl From<serde_json::Error> for PlatformError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
