//! Unified error handling for roomd request processing.
//!
//! Request errors carry a static error code for metrics and render into the
//! JSON error reply sent back on the session.

use crate::admin::AdminError;
use crate::db::DbError;
use crate::state::UnknownPrivacyMode;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

// ============================================================================
// Handler Errors (request processing)
// ============================================================================

/// Errors that can occur while handling one request.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("empty request")]
    EmptyRequest,

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("not enough parameters")]
    NeedMoreParams,

    #[error("{0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Admin(#[from] AdminError),

    #[error("{0}")]
    Database(#[from] DbError),

    #[error("{0}")]
    Configuration(#[from] UnknownPrivacyMode),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyRequest => "empty_request",
            Self::UnknownMethod(_) => "unknown_method",
            Self::NeedMoreParams => "need_more_params",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound => "not_found",
            Self::Admin(e) => e.error_code(),
            Self::Database(DbError::NotFound) => "not_found",
            Self::Database(DbError::AliasTaken(_)) => "alias_taken",
            Self::Database(DbError::InvalidAlias(_)) => "invalid_alias",
            Self::Database(DbError::AlreadyAdded(_)) => "already_added",
            Self::Database(_) => "internal",
            Self::Configuration(_) => "configuration",
            Self::Internal(_) => "internal",
        }
    }

    /// Render as a JSON error reply.
    ///
    /// Admin errors also carry the HTTP-style status their front end would use.
    pub fn to_reply(&self) -> Value {
        match self {
            Self::Admin(e) => json!({
                "ok": false,
                "error": self.to_string(),
                "code": self.error_code(),
                "status": e.status().as_u16(),
            }),
            _ => json!({
                "ok": false,
                "error": self.to_string(),
                "code": self.error_code(),
            }),
        }
    }
}

/// Result type for request handlers.
pub type HandlerResult = Result<Value, HandlerError>;

/// Serialize a handler's result value.
pub fn to_result<T: Serialize + ?Sized>(value: &T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| HandlerError::Internal(e.to_string()))
}

/// Render a successful reply.
pub fn ok_reply(result: Value) -> Value {
    json!({ "ok": true, "result": result })
}
