//! Errors returned by the access-code verification endpoint.
//!
//! Every variant maps to a fixed public message; internal detail never leaves
//! the process.

use axum::http::StatusCode;
use thiserror::Error;

use super::GateError;

/// Failure outcomes of a `/config` request.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("request body is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("access control is enabled and no access code was supplied")]
    CodeRequired,

    #[error("access code digest not found")]
    InvalidCode,

    #[error("unexpected failure: {0}")]
    Internal(#[source] GateError),
}

impl AccessError {
    /// HTTP status for this outcome.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Self::CodeRequired => StatusCode::UNAUTHORIZED,
            Self::InvalidCode => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message placed in the `error` field of the response body.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "Invalid JSON format",
            Self::CodeRequired => "Access code required",
            Self::InvalidCode => "Invalid access code",
            Self::Internal(_) => "Internal Server Error",
        }
    }
}

impl From<GateError> for AccessError {
    fn from(err: GateError) -> Self {
        Self::Internal(err)
    }
}

impl From<AccessError> for GateError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::InvalidJson(source) => {
                Self::validation_with_source("Invalid JSON format", source)
            }
            AccessError::CodeRequired => Self::authentication("Access code required"),
            AccessError::InvalidCode => Self::authentication("Invalid access code"),
            AccessError::Internal(inner) => inner,
        }
    }
}
