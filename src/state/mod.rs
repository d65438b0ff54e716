//! Shared room state.
//!
//! [`Room`] ties together the store, the live privacy mode, the listener
//! lifecycle and the authorization gate. One `Room` is shared by every
//! connection task.

mod lifecycle;
mod privacy;
mod sessions;

#[cfg(test)]
pub use lifecycle::Phase;
pub use lifecycle::{Lifecycle, LifecycleError};
pub use privacy::{PrivacyHandle, PrivacyMode, UnknownPrivacyMode};
pub use sessions::SessionTracker;

use crate::caps::{Gate, Principal};
use crate::db::{Database, DbError};
use crate::handlers::{HandlerKind, HandlerSet};
use crate::identity::Identity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

/// Shared state of a running room.
pub struct Room {
    pub name: String,
    pub db: Database,
    pub privacy: PrivacyHandle,
    pub gate: Gate,
    pub sessions: SessionTracker,
    pub preamble_timeout: Duration,
    lifecycle: Arc<Lifecycle<HandlerSet>>,
}

impl Room {
    pub fn new(
        name: impl Into<String>,
        self_identity: Identity,
        db: Database,
        privacy: PrivacyHandle,
        preamble_timeout: Duration,
    ) -> Self {
        let lifecycle = Arc::new(Lifecycle::new(HandlerSet::new()));
        let gate = Gate::new(
            self_identity,
            privacy.clone(),
            db.clone(),
            Arc::clone(&lifecycle),
        );

        Self {
            name: name.into(),
            db,
            privacy,
            gate,
            sessions: SessionTracker::new(),
            preamble_timeout,
            lifecycle,
        }
    }

    pub fn self_identity(&self) -> &Identity {
        self.gate.self_identity()
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.lifecycle.subscribe()
    }

    #[cfg(test)]
    pub async fn phase(&self) -> Phase {
        self.lifecycle.phase().await
    }

    /// Who is acting on a session, looked up fresh for each request.
    pub async fn principal(
        &self,
        kind: HandlerKind,
        peer: &Identity,
    ) -> Result<Principal, DbError> {
        if kind == HandlerKind::Master {
            return Ok(Principal::Room);
        }
        match self.db.members().get_by_identity(peer).await {
            Ok(member) => Ok(Principal::Member(member)),
            Err(e) if e.is_not_found() => Ok(Principal::Visitor),
            Err(e) => Err(e),
        }
    }

    /// Stop admitting connections.
    ///
    /// Waits for in-flight authorization decisions, then signals every
    /// session task to close.
    pub async fn shutdown(&self) {
        if self.lifecycle.close().await.is_some() {
            info!(room = %self.name, "Listener closed");
            if !self.sessions.is_empty() {
                info!(open_sessions = self.sessions.len(), "Signalled open sessions to close");
            }
        }
    }
}
