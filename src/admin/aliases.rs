//! Alias administration.

use super::{AdminError, Confirm, Flash, Redirect, Route, parse_id};
use crate::db::{Alias, Database, DbError};
use tracing::info;

/// Alias operations driven by an admin front end.
pub struct AliasesAdmin<'a> {
    db: &'a Database,
}

impl<'a> AliasesAdmin<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn overview(&self) -> Result<Vec<Alias>, AdminError> {
        Ok(self.db.aliases().list().await?)
    }

    /// Look up the alias an admin is about to revoke.
    ///
    /// A missing alias sends the caller back to the overview.
    pub async fn revoke_confirm(&self, id: &str) -> Result<Confirm<Alias>, AdminError> {
        let id = parse_id("ID", id)?;

        match self.db.aliases().get_by_id(id).await {
            Ok(alias) => Ok(Confirm::Show(alias)),
            Err(DbError::NotFound) => {
                Ok(Confirm::Redirect(Redirect::found(Route::AliasesOverview)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke an alias by name. Either outcome returns to the overview with a flash.
    pub async fn revoke(&self, name: &str) -> Result<Redirect, AdminError> {
        let back = Redirect::temporary(Route::AliasesOverview);

        match self.db.aliases().revoke(name).await {
            Ok(()) => {
                info!(alias = name, "Alias revoked");
                Ok(back.with_flash(Flash::AliasRevoked))
            }
            Err(DbError::NotFound) => Ok(back.with_flash(Flash::NotFound)),
            Err(e) => Err(e.into()),
        }
    }
}
