//! Member administration.

use super::{AdminError, Confirm, Redirect, Route, parse_id};
use crate::caps::{AdminAction, AdminPolicy, PolicyCheck, Principal, Verdict};
use crate::db::{Database, DbError, Member, Role};
use crate::identity::Identity;
use http::StatusCode;
use tracing::info;

/// Member operations driven by an admin front end.
pub struct MembersAdmin<'a> {
    db: &'a Database,
}

impl<'a> MembersAdmin<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All members, most recent first.
    pub async fn overview(&self) -> Result<Vec<Member>, AdminError> {
        let mut list = self.db.members().list().await?;
        list.reverse();
        Ok(list)
    }

    /// One member by id.
    pub async fn details(&self, id: &str) -> Result<Member, AdminError> {
        let id = parse_id("ID", id)?;
        match self.db.members().get_by_id(id).await {
            Ok(member) => Ok(member),
            Err(DbError::NotFound) => Err(AdminError::bad_request("ID", DbError::NotFound)),
            Err(e) => Err(e.into()),
        }
    }

    /// Look up the member an admin is about to remove.
    ///
    /// A missing member sends the caller back to the overview.
    pub async fn remove_confirm(&self, id: &str) -> Result<Confirm<Member>, AdminError> {
        let id = parse_id("ID", id)?;

        match self.db.members().get_by_id(id).await {
            Ok(member) => Ok(Confirm::Show(member)),
            Err(DbError::NotFound) => {
                Ok(Confirm::Redirect(Redirect::found(Route::MembersOverview)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Add a member with the default role.
    pub async fn add(&self, pub_key: &str) -> Result<Redirect, AdminError> {
        let identity: Identity = pub_key
            .trim()
            .parse()
            .map_err(|e| AdminError::bad_request("Public Key", e))?;

        let member = self.db.members().add(&identity, Role::Member).await?;
        info!(id = member.id, identity = %member.identity, "Member added");

        Ok(Redirect::found(Route::MembersOverview))
    }

    /// Change a member's role. Only admins may do this.
    pub async fn change_role(
        &self,
        current: &Principal,
        id: &str,
        role: &str,
    ) -> Result<Redirect, AdminError> {
        let id_hint = id.trim().parse::<i64>().ok();
        let verdict = match AdminPolicy
            .check(current, &AdminAction::ChangeRole, &id_hint)
            .await
        {
            Ok(v) => v,
            Err(never) => match never {},
        };
        if let Verdict::Deny(reason) = verdict {
            return Err(AdminError::Forbidden(reason));
        }

        let id = parse_id("id", id)?;
        let role: Role = role
            .parse()
            .map_err(|e| AdminError::bad_request("role", e))?;

        // TODO: answer a missing member with not-found instead of an internal error.
        self.db.members().set_role(id, role).await?;
        info!(id, %role, by = %current, "Member role changed");

        Ok(Redirect::temporary(Route::MemberDetails(id)))
    }

    /// Remove a member by id. A missing member still redirects, with 404.
    pub async fn remove(&self, id: &str) -> Result<Redirect, AdminError> {
        let id = parse_id("ID", id)?;

        match self.db.members().remove_id(id).await {
            Ok(()) => {
                info!(id, "Member removed");
                Ok(Redirect::found(Route::MembersOverview))
            }
            Err(DbError::NotFound) => {
                Ok(Redirect::found(Route::MembersOverview).with_status(StatusCode::NOT_FOUND))
            }
            Err(e) => Err(e.into()),
        }
    }
}
