//! Error types for the API client.

/// Failures surfaced by [`ApiClient`](crate::ApiClient) calls.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered 401. The session has already been cleared.
    #[error("not authorized")]
    Unauthorized { message: Option<String> },

    /// The server answered 404.
    #[error("resource not found")]
    NotFound { message: Option<String> },

    /// Any other non-success status.
    #[error("server returned status {status}")]
    Api { status: u16, message: Option<String> },

    /// The body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// A success envelope arrived without a `data` field.
    #[error("response carried no data")]
    MissingData,

    /// The persisted session could not be written.
    #[error("session storage failed: {0}")]
    Storage(String),
}

impl ClientError {
    /// The human-readable error text the backend attached, if any.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message }
            | Self::NotFound { message }
            | Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::NotFound { .. } => Some(404),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// The server message, or `fallback` when the server gave none.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }

    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}
