//! Member repository for database queries.

use super::models::{Member, Role};
use crate::db::{DbError, identity_column, is_unique_violation};
use crate::identity::Identity;
use sqlx::SqlitePool;

type MemberRow = (i64, String, i64, i64);

fn member_from_row((id, identity, role, created_at): MemberRow) -> Result<Member, DbError> {
    Ok(Member {
        id,
        identity: identity_column(&identity)?,
        role: Role::from_i64(role).map_err(|e| DbError::Corrupt(e.to_string()))?,
        created_at,
    })
}

/// Repository for member operations.
pub struct MemberRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> MemberRepository<'a> {
    /// Create a new member repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a new member with the given role.
    ///
    /// Fails with [`DbError::AlreadyAdded`] if the identity is already a member;
    /// the table is left untouched in that case.
    pub async fn add(&self, identity: &Identity, role: Role) -> Result<Member, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO members (identity, role, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(identity.to_string())
        .bind(role.as_i64())
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::AlreadyAdded(identity.clone());
            }
            DbError::from(e)
        })?;

        Ok(Member {
            id: result.last_insert_rowid(),
            identity: identity.clone(),
            role,
            created_at: now,
        })
    }

    /// List all members in insertion order.
    pub async fn list(&self) -> Result<Vec<Member>, DbError> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, identity, role, created_at
            FROM members
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(member_from_row).collect()
    }

    /// Count members.
    pub async fn count(&self) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Get a member by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Member, DbError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, identity, role, created_at
            FROM members
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(member_from_row).ok_or(DbError::NotFound)?
    }

    /// Get a member by identity.
    pub async fn get_by_identity(&self, identity: &Identity) -> Result<Member, DbError> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT id, identity, role, created_at
            FROM members
            WHERE identity = ?
            "#,
        )
        .bind(identity.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(member_from_row).ok_or(DbError::NotFound)?
    }

    /// Replace the role of an existing member. Id and identity are unchanged.
    pub async fn set_role(&self, id: i64, role: Role) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE members SET role = ? WHERE id = ?")
            .bind(role.as_i64())
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    /// Remove a member by id.
    ///
    /// Aliases pointing at the same identity are kept.
    pub async fn remove_id(&self, id: i64) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}
