//! Error types for the engine REST client.
//!
//! # Design
//! Every request funnels its failures into one `Error` enum so callers never
//! see transport-specific types. Failures before a response (DNS, refused
//! connection, timeout) collapse into `Transport`. A non-2xx response with
//! the engine's `{"type", "message"}` body becomes `Engine`; any other
//! non-2xx lands in `Status` with the raw status code and body.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned while building, sending or parsing an engine request.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP exchange failed before any response was received.
    #[error("request to the engine failed: {message}")]
    Transport { message: String },

    /// The engine answered with a failure status and a structured error body.
    #[error("engine returned {status} ({kind}): {message}")]
    Engine {
        status: u16,
        /// The engine's exception type, e.g. `InvalidRequestException`.
        kind: String,
        message: String,
    },

    /// The engine answered with a failure status and no recognisable body.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be decoded.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A required key was absent from an entity's JSON.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A value fell outside the declared set of an enum.
    #[error("invalid {kind} value: {value}")]
    InvalidEnumValue { kind: &'static str, value: String },

    /// The request could not be assembled, e.g. a path placeholder is unset.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request payload could not be encoded.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// HTTP status of the failed response, if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Engine { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the engine reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    pub(crate) fn invalid_enum(kind: &'static str, value: impl ToString) -> Self {
        Self::InvalidEnumValue {
            kind,
            value: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Deserialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display_carries_message() {
        let err = Error::Engine {
            status: 404,
            kind: "InvalidRequestException".to_string(),
            message: "Authorization with id 'x' does not exist".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "engine returned 404 (InvalidRequestException): Authorization with id 'x' does not exist"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn status_code_only_for_responses() {
        let err = Error::Status {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.status_code(), Some(500));
        assert!(!err.is_not_found());

        let err = Error::Transport {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.status_code(), None);
    }

    #[test]
    fn json_errors_become_deserialization_errors() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Deserialization(_)));
    }
}
