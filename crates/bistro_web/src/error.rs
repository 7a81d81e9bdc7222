//! Our custom error type.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type WebResult<T> = Result<T, WebError>;

pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const REQUEST_FAILED: &str = "Request failed";

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum WebError {
    /// The backend answered with a non-success status.
    #[error("{message}")]
    Api { status: u16, message: String },
    /// No response was obtained at all.
    #[error("Network error: {0}")]
    Network(String),
    /// A call that needs a bearer token could not get one.
    #[error("Not signed in")]
    AuthUnavailable,
    /// A success response did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),
    /// Rejected locally before anything was sent.
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Js(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Api,
    Network,
    AuthUnavailable,
    Decode,
    Invalid,
    Js,
}

impl WebError {
    pub fn api(status: u16, message: impl ToString) -> Self {
        Self::Api {
            status,
            message: message.to_string(),
        }
    }

    pub fn invalid(message: impl ToString) -> Self {
        Self::Invalid(message.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { .. } => ErrorKind::Api,
            Self::Network(_) => ErrorKind::Network,
            Self::AuthUnavailable => ErrorKind::AuthUnavailable,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Invalid(_) => ErrorKind::Invalid,
            Self::Js(_) => ErrorKind::Js,
        }
    }

    /// Text suitable for showing to the viewer.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Network(_) => {
                "Could not reach the restaurant. Check your connection and try again.".to_string()
            }
            Self::AuthUnavailable => "Please sign in to continue.".to_string(),
            Self::Decode(_) => "The restaurant sent a response we could not read.".to_string(),
            Self::Invalid(message) | Self::Js(message) => message.clone(),
        }
    }
}

impl From<serde_json::Error> for WebError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

impl From<JsValue> for WebError {
    fn from(value: JsValue) -> Self {
        Self::Js(format!("{value:#?}"))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn api_errors_show_backend_message() {
        let err = WebError::api(401, "expired token");
        assert_eq!(err.to_string(), "expired token");
        assert_eq!(err.user_message(), "expired token");
        assert_eq!(err.kind(), ErrorKind::Api);
    }

    #[test]
    fn network_errors_show_generic_message() {
        let err = WebError::Network("TypeError: Failed to fetch".to_string());
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(!err.user_message().contains("TypeError"));
    }

    #[test]
    fn auth_unavailable_is_its_own_kind() {
        assert_eq!(WebError::AuthUnavailable.kind(), ErrorKind::AuthUnavailable);
        assert_ne!(WebError::AuthUnavailable, WebError::api(401, "Not signed in"));
    }
}
