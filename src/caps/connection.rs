//! Connection policy: may a verified peer connect to the room at all?

use super::gate::GateError;
use super::policy::{PolicyCheck, Verdict};
use crate::db::{Database, DbError};
use crate::identity::Identity;
use crate::state::{PrivacyHandle, PrivacyMode};
use async_trait::async_trait;
use tracing::{debug, trace};

/// Reason given to non-members of a restricted room.
pub const RESTRICTED_TO_MEMBERS: &str = "access restricted to members";

/// The single action a peer takes at the connection gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connect;

/// Decides whether a (non-self) peer may connect, based on the privacy mode
/// and, in restricted rooms, membership.
pub struct ConnectionPolicy {
    privacy: PrivacyHandle,
    db: Database,
}

impl ConnectionPolicy {
    pub fn new(privacy: PrivacyHandle, db: Database) -> Self {
        Self { privacy, db }
    }
}

#[async_trait]
impl PolicyCheck for ConnectionPolicy {
    type Principal = Identity;
    type Action = Connect;
    /// The room itself.
    type Resource = ();
    type Error = GateError;

    async fn check(
        &self,
        remote: &Identity,
        _action: &Connect,
        _room: &(),
    ) -> Result<Verdict, GateError> {
        let mode = self
            .privacy
            .load()
            .map_err(|e| GateError::Configuration(e.0))?;

        // Open and community rooms never consult the member store.
        if mode == PrivacyMode::Restricted {
            match self.db.members().get_by_identity(remote).await {
                Ok(member) => {
                    debug!(peer = %remote, role = %member.role, "Member admitted to restricted room");
                }
                Err(DbError::NotFound) => {
                    trace!(peer = %remote, "Non-member denied by restricted room");
                    return Ok(Verdict::deny(RESTRICTED_TO_MEMBERS));
                }
                Err(e) => return Err(GateError::Store(e)),
            }
        }

        Ok(Verdict::Allow)
    }
}
