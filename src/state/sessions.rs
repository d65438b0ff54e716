//! Live session registry.

use crate::handlers::HandlerKind;
use crate::identity::Identity;
use crate::metrics;
use dashmap::DashMap;
use serde::Serialize;
use std::net::SocketAddr;
use uuid::Uuid;

/// What is known about one open session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub identity: Identity,
    pub kind: HandlerKind,
    pub addr: SocketAddr,
    pub connected_at: i64,
}

/// Concurrent map of open sessions keyed by session id.
#[derive(Debug, Default)]
pub struct SessionTracker {
    sessions: DashMap<Uuid, SessionInfo>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an admitted session.
    pub fn open(&self, id: Uuid, identity: Identity, kind: HandlerKind, addr: SocketAddr) {
        self.sessions.insert(
            id,
            SessionInfo {
                identity,
                kind,
                addr,
                connected_at: chrono::Utc::now().timestamp(),
            },
        );
        metrics::session_opened();
    }

    pub fn close(&self, id: &Uuid) -> Option<SessionInfo> {
        let removed = self.sessions.remove(id).map(|(_, info)| info);
        if removed.is_some() {
            metrics::session_closed();
        }
        removed
    }

    #[cfg(test)]
    pub fn get(&self, id: &Uuid) -> Option<SessionInfo> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
