//! Failure taxonomy for calls made through [`crate::AdminClient`].

use thiserror::Error;

/// Message shown when a failure carries nothing more specific.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received.
    #[error("request failed before a response was received: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server responded with status {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },
    #[error("failed to decode server response: {0}")]
    Decode(String),
    /// Rejected before dispatch; no request was sent.
    #[error("{0}")]
    Validation(String),
    #[error("not signed in")]
    Unauthenticated,
    #[error("session storage failure: {0:#}")]
    Session(#[from] anyhow::Error),
    #[error("invalid API base url '{0}'")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// Text suitable for an error banner or an inline notice.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server {
                message: Some(message),
                ..
            } => message.clone(),
            Self::Validation(message) => message.clone(),
            Self::Unauthenticated => "Please sign in to continue.".to_string(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}
