//! Error types for remote calls and configuration.

/// Errors produced by [`crate::api::AuthApi`] calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service answered with a non-2xx status.
    #[error("request rejected: status {status}")]
    Rejected { status: u16, message: Option<String> },

    /// The request never produced a response (connect failure, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Server-supplied message for a rejection, if the body carried one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Rejected { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// True when the failure came from the wire rather than from the service.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Malformed(_) | Self::HttpClientBuild(_))
    }
}

/// Errors produced while building [`crate::config::ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}
