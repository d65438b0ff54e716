//! Member database models.

use crate::identity::Identity;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Privilege level of a member. Ordered `Member < Moderator < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member = 1,
    Moderator = 2,
    Admin = 3,
}

/// Role text or stored value that does not name a role.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid role: {0:?}")]
pub struct InvalidRole(pub String);

impl Role {
    /// Every role, lowest first.
    pub const ALL: [Role; 3] = [Role::Member, Role::Moderator, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Value stored in the `role` column.
    pub fn as_i64(&self) -> i64 {
        *self as i64
    }

    pub fn from_i64(value: i64) -> Result<Self, InvalidRole> {
        match value {
            1 => Ok(Self::Member),
            2 => Ok(Self::Moderator),
            3 => Ok(Self::Admin),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" => Ok(Self::Member),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            _ => Err(InvalidRole(s.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A room member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: i64,
    pub identity: Identity,
    pub role: Role,
    pub created_at: i64,
}
