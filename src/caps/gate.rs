//! Connection authorization gate.
//!
//! For every verified inbound connection the transport asks the [`Gate`]
//! which handler set the peer gets:
//!
//! 1. the room's own identity always gets the master handler set;
//! 2. otherwise the privacy mode is read (an unknown mode fails this one
//!    connection with [`GateError::Configuration`]);
//! 3. restricted rooms deny peers without a membership record;
//! 4. everyone else gets the public handler set.
//!
//! Decisions are made inside the listener [`Lifecycle`] guard, so a decision
//! either completes before shutdown begins or is rejected after it.

use super::connection::{Connect, ConnectionPolicy};
use super::policy::{PolicyCheck, Verdict};
use crate::db::{Database, DbError};
use crate::handlers::{HandlerSet, SessionHandler};
use crate::identity::Identity;
use crate::metrics;
use crate::state::{Lifecycle, LifecycleError, PrivacyHandle};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

/// Which capability set a connection receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    /// The room's own identity: full capability set.
    SelfHandler,
    /// Any admitted peer.
    PublicHandler,
    /// Connection refused.
    Denied(String),
}

impl AuthorizationDecision {
    /// Static label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SelfHandler => "self",
            Self::PublicHandler => "public",
            Self::Denied(_) => "denied",
        }
    }
}

/// Errors that abort one connection attempt. The listener keeps serving.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("listener unavailable: {0}")]
    Closed(#[from] LifecycleError),

    #[error("running with unknown privacy mode {0}")]
    Configuration(u8),

    #[error("{0}")]
    Denied(String),

    #[error("member lookup failed: {0}")]
    Store(DbError),
}

impl GateError {
    /// Static error code string for metrics and client replies.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Closed(_) => "closed",
            Self::Configuration(_) => "configuration",
            Self::Denied(_) => "denied",
            Self::Store(_) => "store",
        }
    }
}

/// The per-connection authorization gate.
pub struct Gate {
    self_identity: Identity,
    policy: ConnectionPolicy,
    lifecycle: Arc<Lifecycle<HandlerSet>>,
}

impl Gate {
    pub fn new(
        self_identity: Identity,
        privacy: PrivacyHandle,
        db: Database,
        lifecycle: Arc<Lifecycle<HandlerSet>>,
    ) -> Self {
        Self {
            self_identity,
            policy: ConnectionPolicy::new(privacy, db),
            lifecycle,
        }
    }

    pub fn self_identity(&self) -> &Identity {
        &self.self_identity
    }

    /// Decide which handler class `remote` receives.
    pub async fn authorize(&self, remote: &Identity) -> Result<AuthorizationDecision, GateError> {
        let _open = self.lifecycle.enter().await?;
        self.decide(remote).await
    }

    /// Select the handler set for a verified connection.
    ///
    /// This is the function the transport calls once per connection before
    /// serving any request; an error means the connection must be closed.
    pub async fn make_handler(&self, remote: &Identity) -> Result<SessionHandler, GateError> {
        let handlers = self.lifecycle.enter().await?;

        match self.decide(remote).await? {
            AuthorizationDecision::SelfHandler => Ok(handlers.master()),
            AuthorizationDecision::PublicHandler => Ok(handlers.public()),
            AuthorizationDecision::Denied(reason) => Err(GateError::Denied(reason)),
        }
    }

    /// Run the decision. Callers hold the lifecycle guard.
    async fn decide(&self, remote: &Identity) -> Result<AuthorizationDecision, GateError> {
        let decision = if remote.ct_eq(&self.self_identity) {
            Ok(AuthorizationDecision::SelfHandler)
        } else {
            match self.policy.check(remote, &Connect, &()).await {
                Ok(Verdict::Allow) => Ok(AuthorizationDecision::PublicHandler),
                Ok(Verdict::Deny(reason)) => Ok(AuthorizationDecision::Denied(reason)),
                Err(e) => Err(e),
            }
        };

        match &decision {
            Ok(d) => {
                metrics::record_authorization(d.label());
                match d {
                    AuthorizationDecision::Denied(reason) => {
                        info!(peer = %remote, %reason, "Connection denied")
                    }
                    _ => debug!(peer = %remote, decision = d.label(), "Connection authorized"),
                }
            }
            Err(e @ GateError::Configuration(_)) => {
                metrics::record_authorization(e.error_code());
                error!(peer = %remote, error = %e, "Privacy mode invariant violated; rejecting connection");
            }
            Err(e) => {
                metrics::record_authorization(e.error_code());
                error!(peer = %remote, error = %e, "Authorization failed");
            }
        }

        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Role;
    use crate::handlers::HandlerKind;
    use crate::identity::Algorithm;
    use crate::state::PrivacyMode;

    fn identity(byte: u8) -> Identity {
        Identity::new([byte; 32], Algorithm::Ed25519)
    }

    struct Fixture {
        gate: Gate,
        db: Database,
        privacy: PrivacyHandle,
        lifecycle: Arc<Lifecycle<HandlerSet>>,
    }

    async fn fixture(privacy: PrivacyHandle) -> Fixture {
        let db = Database::new(":memory:").await.unwrap();
        let lifecycle = Arc::new(Lifecycle::new(HandlerSet::new()));
        let gate = Gate::new(identity(0), privacy.clone(), db.clone(), Arc::clone(&lifecycle));
        Fixture {
            gate,
            db,
            privacy,
            lifecycle,
        }
    }

    #[tokio::test]
    async fn test_self_identity_always_gets_self_handler() {
        for raw in [1, 2, 3, 0, 200] {
            let f = fixture(PrivacyHandle::from_raw(raw)).await;
            assert_eq!(
                f.gate.authorize(&identity(0)).await.unwrap(),
                AuthorizationDecision::SelfHandler
            );
        }
    }

    #[tokio::test]
    async fn test_open_and_community_skip_member_store() {
        for mode in [PrivacyMode::Open, PrivacyMode::Community] {
            let f = fixture(PrivacyHandle::new(mode)).await;
            // An unreachable store must not matter outside restricted mode.
            f.db.pool().close().await;

            assert_eq!(
                f.gate.authorize(&identity(1)).await.unwrap(),
                AuthorizationDecision::PublicHandler
            );
        }
    }

    #[tokio::test]
    async fn test_restricted_denies_non_members() {
        let f = fixture(PrivacyHandle::new(PrivacyMode::Restricted)).await;
        assert_eq!(
            f.gate.authorize(&identity(1)).await.unwrap(),
            AuthorizationDecision::Denied("access restricted to members".to_string())
        );
    }

    #[tokio::test]
    async fn test_restricted_admits_members_after_add() {
        let f = fixture(PrivacyHandle::new(PrivacyMode::Restricted)).await;
        let x = identity(42);

        assert!(matches!(
            f.gate.authorize(&x).await.unwrap(),
            AuthorizationDecision::Denied(_)
        ));

        f.db.members().add(&x, Role::Member).await.unwrap();

        assert_eq!(
            f.gate.authorize(&x).await.unwrap(),
            AuthorizationDecision::PublicHandler
        );
    }

    #[tokio::test]
    async fn test_privacy_change_applies_to_next_decision() {
        let f = fixture(PrivacyHandle::new(PrivacyMode::Open)).await;
        assert_eq!(
            f.gate.authorize(&identity(1)).await.unwrap(),
            AuthorizationDecision::PublicHandler
        );

        f.privacy.store(PrivacyMode::Restricted);
        assert!(matches!(
            f.gate.authorize(&identity(1)).await.unwrap(),
            AuthorizationDecision::Denied(_)
        ));
    }

    #[tokio::test]
    async fn test_unknown_mode_fails_only_that_attempt() {
        let f = fixture(PrivacyHandle::from_raw(9)).await;

        let err = f.gate.authorize(&identity(1)).await.unwrap_err();
        assert!(matches!(err, GateError::Configuration(9)));

        f.privacy.store(PrivacyMode::Community);
        assert_eq!(
            f.gate.authorize(&identity(1)).await.unwrap(),
            AuthorizationDecision::PublicHandler
        );
    }

    #[tokio::test]
    async fn test_make_handler_selects_set() {
        let f = fixture(PrivacyHandle::new(PrivacyMode::Restricted)).await;
        f.db.members().add(&identity(5), Role::Member).await.unwrap();

        assert_eq!(
            f.gate.make_handler(&identity(0)).await.unwrap().kind(),
            HandlerKind::Master
        );
        assert_eq!(
            f.gate.make_handler(&identity(5)).await.unwrap().kind(),
            HandlerKind::Public
        );
        assert!(matches!(
            f.gate.make_handler(&identity(6)).await,
            Err(GateError::Denied(_))
        ));
    }

    #[tokio::test]
    async fn test_no_decisions_after_close() {
        let f = fixture(PrivacyHandle::new(PrivacyMode::Open)).await;
        f.lifecycle.close().await;

        assert!(matches!(
            f.gate.authorize(&identity(0)).await,
            Err(GateError::Closed(LifecycleError::Closed))
        ));
        assert!(matches!(
            f.gate.make_handler(&identity(1)).await,
            Err(GateError::Closed(_))
        ));
    }
}
