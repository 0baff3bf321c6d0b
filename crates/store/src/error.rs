use storybook_core::error::CoreError;

/// Failure of a single persistence backend call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote store returned a non-2xx status code.
    #[error("Remote store error ({status}): {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The remote store answered `{"success": false}`.
    #[error("Remote store rejected the write: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored or fetched content is not a valid story document.
    #[error("Invalid document: {0}")]
    Invalid(#[from] CoreError),

    /// The backend needed for this call is not configured.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

/// Errors surfaced to callers of the story store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The input was rejected (malformed import, invalid document shape).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The initial load has not completed yet.
    #[error("Story store is still loading")]
    NotReady,

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading or writing an export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = GatewayError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "Remote store error (502): bad gateway");
    }

    #[test]
    fn request_error_display() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = GatewayError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }

    #[test]
    fn core_error_is_transparent() {
        let err = StoreError::from(CoreError::Validation("scenes must be an array".into()));
        assert_eq!(err.to_string(), "Validation failed: scenes must be an array");
    }
}
