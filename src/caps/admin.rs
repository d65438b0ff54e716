//! Session-level admin policy.
//!
//! Separate from the connection gate: this rule looks at who is driving an
//! admin action (the room itself or a member with some role), not at the
//! transport identity of a connection.

use super::policy::{PolicyCheck, Verdict};
use crate::db::{Member, Role};
use async_trait::async_trait;
use std::convert::Infallible;
use std::fmt;
use tracing::{debug, trace};

/// Whoever drives an admin action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// The room's own identity (local administrative tooling).
    Room,
    /// A known member.
    Member(Member),
    /// A connected peer without a membership record.
    Visitor,
}

impl Principal {
    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Room => Some(Role::Admin),
            Self::Member(member) => Some(member.role),
            Self::Visitor => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room => f.write_str("room"),
            Self::Member(member) => write!(f, "member:{}", member.id),
            Self::Visitor => f.write_str("visitor"),
        }
    }
}

/// Admin actions guarded by a role check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    ChangeRole,
    SetPrivacy,
}

impl AdminAction {
    /// Lowest role allowed to take this action.
    pub fn required_role(&self) -> Role {
        match self {
            Self::ChangeRole | Self::SetPrivacy => Role::Admin,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeRole => "change-role",
            Self::SetPrivacy => "set-privacy",
        }
    }
}

/// Role-based admin rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminPolicy;

#[async_trait]
impl PolicyCheck for AdminPolicy {
    type Principal = Principal;
    type Action = AdminAction;
    /// Id of the affected record, if any.
    type Resource = Option<i64>;
    type Error = Infallible;

    async fn check(
        &self,
        principal: &Principal,
        action: &AdminAction,
        resource: &Option<i64>,
    ) -> Result<Verdict, Infallible> {
        let required = action.required_role();
        match principal.role() {
            Some(role) if role >= required => {
                debug!(principal = %principal, action = action.name(), resource = ?resource, "Admin action granted");
                Ok(Verdict::Allow)
            }
            _ => {
                trace!(principal = %principal, action = action.name(), resource = ?resource, "Admin action denied");
                Ok(Verdict::deny(format!("not an {required}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Algorithm, Identity};

    fn member(role: Role) -> Principal {
        Principal::Member(Member {
            id: 1,
            identity: Identity::new([1; 32], Algorithm::Ed25519),
            role,
            created_at: 0,
        })
    }

    async fn verdict(principal: &Principal, action: AdminAction) -> Verdict {
        match AdminPolicy.check(principal, &action, &Some(1)).await {
            Ok(v) => v,
            Err(never) => match never {},
        }
    }

    #[tokio::test]
    async fn test_change_role_requires_admin() {
        assert!(verdict(&member(Role::Admin), AdminAction::ChangeRole).await.is_allowed());
        assert!(verdict(&Principal::Room, AdminAction::ChangeRole).await.is_allowed());

        assert_eq!(
            verdict(&member(Role::Moderator), AdminAction::ChangeRole).await,
            Verdict::deny("not an admin")
        );
        assert!(!verdict(&member(Role::Member), AdminAction::ChangeRole).await.is_allowed());
        assert!(!verdict(&Principal::Visitor, AdminAction::ChangeRole).await.is_allowed());
    }

    #[tokio::test]
    async fn test_set_privacy_requires_admin() {
        assert!(verdict(&member(Role::Admin), AdminAction::SetPrivacy).await.is_allowed());
        assert!(!verdict(&member(Role::Moderator), AdminAction::SetPrivacy).await.is_allowed());
    }
}
