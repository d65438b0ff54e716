//! Room configuration repository.
//!
//! Persists room-wide settings that admins change at runtime.

use super::DbError;
use crate::state::PrivacyMode;
use sqlx::SqlitePool;

/// Repository for the single-row `room_config` table.
pub struct RoomConfigRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RoomConfigRepository<'a> {
    /// Create a new room configuration repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored privacy mode value, if one was ever written.
    ///
    /// The value is returned raw; interpreting it is up to the caller.
    pub async fn privacy_mode_raw(&self) -> Result<Option<i64>, DbError> {
        let value =
            sqlx::query_scalar::<_, i64>("SELECT privacy_mode FROM room_config WHERE id = 1")
                .fetch_optional(self.pool)
                .await?;
        Ok(value)
    }

    /// Persist the privacy mode.
    pub async fn set_privacy_mode(&self, mode: PrivacyMode) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO room_config (id, privacy_mode) VALUES (1, ?)
            ON CONFLICT(id) DO UPDATE SET privacy_mode = excluded.privacy_mode
            "#,
        )
        .bind(i64::from(mode.as_u8()))
        .execute(self.pool)
        .await?;
        Ok(())
    }
}
