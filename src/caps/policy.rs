//! The policy check abstraction.
//!
//! Both the per-connection gate and session-level admin checks are expressed
//! as a [`PolicyCheck`]: given a principal, an action and a resource, answer
//! allow or deny. Implementations log every verdict for audit.

use async_trait::async_trait;
use std::fmt;

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(String),
}

impl Verdict {
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny(reason.into())
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny(reason) => write!(f, "deny: {reason}"),
        }
    }
}

/// A single authorization rule.
#[async_trait]
pub trait PolicyCheck: Send + Sync {
    /// Who is asking.
    type Principal: Send + Sync + ?Sized;
    /// What they want to do.
    type Action: Send + Sync + ?Sized;
    /// What they want to do it to.
    type Resource: Send + Sync + ?Sized;
    /// Failure that prevents reaching a verdict.
    type Error: Send;

    async fn check(
        &self,
        principal: &Self::Principal,
        action: &Self::Action,
        resource: &Self::Resource,
    ) -> Result<Verdict, Self::Error>;
}
