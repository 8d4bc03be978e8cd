//! Error handling and custom error types
//!
//! Provides unified error handling across the client using thiserror. Every
//! failure of the upload pipeline is classified into an [`ErrorKind`] so
//! callers can decide whether to retry.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Network,
    Timeout,
    Api,
    Config,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Auth(_) => ErrorKind::Auth,
            Error::Network(_) => ErrorKind::Network,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::Api { .. } => ErrorKind::Api,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// HTTP status of a server rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the server refused the bearer credential.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// Classify a reqwest transport failure.
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::Timeout(timeout)
        } else {
            Error::Network(err.to_string())
        }
    }

    /// Human-readable guidance for front ends.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation(msg) => capitalize(msg),
            Error::Auth(_) => "Authentication failed. Please try again later.".to_string(),
            Error::Network(_) => concat!(
                "Network error: could not connect to the server. ",
                "Check your connection and that the server address is correct."
            )
            .to_string(),
            Error::Timeout(_) => {
                "Request timed out. The server may be slow or unreachable. Please try again."
                    .to_string()
            }
            Error::Api { status, message } if *status >= 500 => {
                format!("The server failed to process the image ({}): {}", status, message)
            }
            Error::Api { message, .. } => message.clone(),
            Error::Config(msg) => format!("Client is misconfigured: {}", msg),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_rejection_only_for_401_and_403() {
        let unauthorized = Error::Api {
            status: 401,
            message: "invalid token".to_string(),
        };
        let forbidden = Error::Api {
            status: 403,
            message: "forbidden".to_string(),
        };
        let bad_request = Error::Api {
            status: 400,
            message: "bad filter".to_string(),
        };

        assert!(unauthorized.is_auth_rejection());
        assert!(forbidden.is_auth_rejection());
        assert!(!bad_request.is_auth_rejection());
        assert!(!Error::Auth("down".to_string()).is_auth_rejection());
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            Error::Validation("no image selected".to_string()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            Error::Timeout(Duration::from_secs(120)).kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            Error::Api {
                status: 502,
                message: String::new()
            }
            .kind(),
            ErrorKind::Api
        );
    }

    #[test]
    fn test_user_message_surfaces_client_error_text() {
        let err = Error::Api {
            status: 422,
            message: "Unknown filter".to_string(),
        };
        assert_eq!(err.user_message(), "Unknown filter");
    }

    #[test]
    fn test_user_message_capitalizes_validation() {
        let err = Error::Validation("no image selected".to_string());
        assert_eq!(err.user_message(), "No image selected");
    }

    #[test]
    fn test_timeout_display() {
        let err = Error::Timeout(Duration::from_secs(120));
        assert_eq!(err.to_string(), "Request timed out after 120s");
    }
}
