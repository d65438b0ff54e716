//! Room privacy settings.

use super::{AdminError, Redirect, Route};
use crate::caps::{AdminAction, AdminPolicy, PolicyCheck, Principal, Verdict};
use crate::db::Database;
use crate::state::{PrivacyHandle, PrivacyMode};
use tracing::info;

/// Changes the room's privacy mode at runtime.
pub struct PrivacyAdmin<'a> {
    db: &'a Database,
    privacy: &'a PrivacyHandle,
}

impl<'a> PrivacyAdmin<'a> {
    pub fn new(db: &'a Database, privacy: &'a PrivacyHandle) -> Self {
        Self { db, privacy }
    }

    /// Persist a new mode, then publish it to the gate.
    ///
    /// The next authorization decision observes the new mode.
    pub async fn set(&self, current: &Principal, mode: &str) -> Result<Redirect, AdminError> {
        let verdict = match AdminPolicy.check(current, &AdminAction::SetPrivacy, &None).await {
            Ok(v) => v,
            Err(never) => match never {},
        };
        if let Verdict::Deny(reason) = verdict {
            return Err(AdminError::Forbidden(reason));
        }

        let mode: PrivacyMode = mode
            .parse()
            .map_err(|e| AdminError::bad_request("privacy_mode", e))?;

        let _writer = self.privacy.lock_writes().await;
        self.db.room_config().set_privacy_mode(mode).await?;
        self.privacy.store(mode);
        info!(%mode, by = %current, "Privacy mode changed");

        Ok(Redirect::found(Route::Settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_privacy() {
        let db = Database::new(":memory:").await.unwrap();
        let privacy = PrivacyHandle::new(PrivacyMode::Open);
        let admin_surface = PrivacyAdmin::new(&db, &privacy);

        admin_surface.set(&Principal::Room, "restricted").await.unwrap();
        assert_eq!(privacy.load(), Ok(PrivacyMode::Restricted));
        assert_eq!(db.room_config().privacy_mode_raw().await.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_set_privacy_rejected() {
        let db = Database::new(":memory:").await.unwrap();
        let privacy = PrivacyHandle::new(PrivacyMode::Open);
        let admin_surface = PrivacyAdmin::new(&db, &privacy);

        assert!(matches!(
            admin_surface.set(&Principal::Visitor, "restricted").await,
            Err(AdminError::Forbidden(_))
        ));
        assert!(matches!(
            admin_surface.set(&Principal::Room, "secret").await,
            Err(AdminError::BadRequest { field: "privacy_mode", .. })
        ));
        assert_eq!(privacy.load(), Ok(PrivacyMode::Open));
        assert_eq!(db.room_config().privacy_mode_raw().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_changes_keep_store_and_handle_in_step() {
        let db = Database::new(":memory:").await.unwrap();
        let privacy = PrivacyHandle::new(PrivacyMode::Open);

        for _ in 0..20 {
            let tasks: Vec<_> = ["open", "community", "restricted"]
                .into_iter()
                .map(|mode| {
                    let db = db.clone();
                    let privacy = privacy.clone();
                    tokio::spawn(async move {
                        PrivacyAdmin::new(&db, &privacy)
                            .set(&Principal::Room, mode)
                            .await
                            .unwrap();
                    })
                })
                .collect();
            for task in tasks {
                task.await.unwrap();
            }

            let persisted = db.room_config().privacy_mode_raw().await.unwrap();
            let live = privacy.load().unwrap();
            assert_eq!(persisted, Some(i64::from(live.as_u8())));
        }
    }
}
