//! Admin mutation surface.
//!
//! Validates raw caller input (form-style text fields), calls the member,
//! alias and room-config repositories, and maps their errors to outcomes a
//! front end can present: a redirect with a status and an optional flash
//! message, or an [`AdminError`] with an HTTP-style status.

mod aliases;
mod members;
mod privacy;

pub use aliases::AliasesAdmin;
pub use members::MembersAdmin;
pub use privacy::PrivacyAdmin;

use crate::db::DbError;
use http::StatusCode;
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};
use std::fmt;
use thiserror::Error;

/// Errors surfaced by admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("bad request ({field}): {details}")]
    BadRequest { field: &'static str, details: String },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("database error: {0}")]
    Database(#[from] DbError),
}

impl AdminError {
    pub fn bad_request(field: &'static str, details: impl fmt::Display) -> Self {
        Self::BadRequest {
            field,
            details: details.to_string(),
        }
    }

    /// Status a front end should answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(DbError::AlreadyAdded(_)) => StatusCode::BAD_REQUEST,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Static error code string for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Forbidden(_) => "forbidden",
            Self::Database(DbError::AlreadyAdded(_)) => "already_added",
            Self::Database(_) => "internal",
        }
    }
}

/// Where a redirect points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    MembersOverview,
    MemberDetails(i64),
    AliasesOverview,
    Settings,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MembersOverview => f.write_str("/admin/members"),
            Self::MemberDetails(id) => write!(f, "/admin/member?id={id}"),
            Self::AliasesOverview => f.write_str("/admin/aliases"),
            Self::Settings => f.write_str("/admin/settings"),
        }
    }
}

/// One-shot message shown after a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Flash {
    AliasRevoked,
    NotFound,
}

/// Successful outcome of a mutation: go to `to` with `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: Route,
    pub status: StatusCode,
    pub flash: Option<Flash>,
}

impl Redirect {
    pub fn found(to: Route) -> Self {
        Self {
            to,
            status: StatusCode::FOUND,
            flash: None,
        }
    }

    pub fn temporary(to: Route) -> Self {
        Self {
            to,
            status: StatusCode::TEMPORARY_REDIRECT,
            flash: None,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }
}

impl Serialize for Redirect {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Redirect", 3)?;
        s.serialize_field("redirect", &self.to.to_string())?;
        s.serialize_field("status", &self.status.as_u16())?;
        s.serialize_field("flash", &self.flash)?;
        s.end()
    }
}

/// Result of a confirmation lookup: show the record, or bounce back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Confirm<T> {
    Show(T),
    Redirect(Redirect),
}

/// Parse a numeric record id from a text field.
fn parse_id(field: &'static str, text: &str) -> Result<i64, AdminError> {
    text.trim()
        .parse::<i64>()
        .map_err(|e| AdminError::bad_request(field, e))
}
