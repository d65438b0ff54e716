//! Alias repository.
//!
//! Aliases map human-readable names to member identities. Names are unique
//! and case-sensitive; one identity may hold several aliases. Alias and
//! membership lifecycles are independent: removing a member keeps its aliases.

use super::{DbError, identity_column, is_unique_violation};
use crate::identity::Identity;
use serde::Serialize;
use sqlx::SqlitePool;

/// Longest accepted alias name.
pub const MAX_ALIAS_LEN: usize = 63;

/// A registered alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Alias {
    pub id: i64,
    pub name: String,
    pub identity: Identity,
    pub created_at: i64,
}

type AliasRow = (i64, String, String, i64);

fn alias_from_row((id, name, identity, created_at): AliasRow) -> Result<Alias, DbError> {
    Ok(Alias {
        id,
        name,
        identity: identity_column(&identity)?,
        created_at,
    })
}

/// Check an alias name: 1 to 63 ASCII letters, digits, `-` or `_`.
pub fn is_valid_alias(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_ALIAS_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Repository for alias operations.
pub struct AliasRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AliasRepository<'a> {
    /// Create a new alias repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new alias for an identity.
    pub async fn register(&self, name: &str, identity: &Identity) -> Result<Alias, DbError> {
        if !is_valid_alias(name) {
            return Err(DbError::InvalidAlias(name.to_string()));
        }

        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO aliases (name, identity, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(identity.to_string())
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return DbError::AliasTaken(name.to_string());
            }
            DbError::from(e)
        })?;

        Ok(Alias {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            identity: identity.clone(),
            created_at: now,
        })
    }

    /// List all aliases in insertion order.
    pub async fn list(&self) -> Result<Vec<Alias>, DbError> {
        let rows = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT id, name, identity, created_at
            FROM aliases
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(alias_from_row).collect()
    }

    /// Get an alias by id.
    pub async fn get_by_id(&self, id: i64) -> Result<Alias, DbError> {
        let row = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT id, name, identity, created_at
            FROM aliases
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(alias_from_row).ok_or(DbError::NotFound)?
    }

    /// Look up an alias by its exact name.
    pub async fn resolve(&self, name: &str) -> Result<Alias, DbError> {
        let row = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT id, name, identity, created_at
            FROM aliases
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool)
        .await?;

        row.map(alias_from_row).ok_or(DbError::NotFound)?
    }

    /// Revoke the alias with the given name.
    pub async fn revoke(&self, name: &str) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM aliases WHERE name = ?")
            .bind(name)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, Role};
    use crate::identity::Algorithm;

    fn identity(byte: u8) -> Identity {
        Identity::new([byte; 32], Algorithm::Ed25519)
    }

    #[test]
    fn test_alias_names() {
        assert!(is_valid_alias("alice"));
        assert!(is_valid_alias("Bob_the-2nd"));
        assert!(!is_valid_alias(""));
        assert!(!is_valid_alias("has space"));
        assert!(!is_valid_alias("dot.name"));
        assert!(!is_valid_alias(&"a".repeat(MAX_ALIAS_LEN + 1)));
    }

    #[tokio::test]
    async fn test_register_and_resolve() {
        let db = Database::new(":memory:").await.unwrap();
        let aliases = db.aliases();

        let alice = aliases.register("alice", &identity(1)).await.unwrap();
        assert_eq!(aliases.resolve("alice").await.unwrap(), alice);
        assert_eq!(aliases.get_by_id(alice.id).await.unwrap(), alice);
        assert!(aliases.resolve("nobody").await.unwrap_err().is_not_found());
        assert!(aliases.get_by_id(alice.id + 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_names_are_unique_and_case_sensitive() {
        let db = Database::new(":memory:").await.unwrap();
        let aliases = db.aliases();

        aliases.register("alice", &identity(1)).await.unwrap();
        let err = aliases.register("alice", &identity(2)).await.unwrap_err();
        assert!(matches!(err, DbError::AliasTaken(ref n) if n == "alice"));

        aliases.register("Alice", &identity(2)).await.unwrap();
        assert_eq!(aliases.resolve("Alice").await.unwrap().identity, identity(2));
        assert_eq!(aliases.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_identity_may_hold_several_aliases() {
        let db = Database::new(":memory:").await.unwrap();
        let aliases = db.aliases();

        aliases.register("one", &identity(5)).await.unwrap();
        aliases.register("two", &identity(5)).await.unwrap();

        let list = aliases.list().await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.iter().all(|a| a.identity == identity(5)));
    }

    #[tokio::test]
    async fn test_invalid_name_rejected() {
        let db = Database::new(":memory:").await.unwrap();
        let err = db
            .aliases()
            .register("no spaces", &identity(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidAlias(_)));
        assert!(db.aliases().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_revoke() {
        let db = Database::new(":memory:").await.unwrap();
        let aliases = db.aliases();
        aliases.register("alice", &identity(1)).await.unwrap();
        let bob = aliases.register("bob", &identity(2)).await.unwrap();

        aliases.revoke("alice").await.unwrap();
        assert_eq!(aliases.list().await.unwrap(), vec![bob.clone()]);

        assert!(aliases.revoke("alice").await.unwrap_err().is_not_found());
        assert_eq!(aliases.list().await.unwrap(), vec![bob]);
    }

    #[tokio::test]
    async fn test_member_removal_keeps_aliases() {
        let db = Database::new(":memory:").await.unwrap();
        let member = db.members().add(&identity(7), Role::Member).await.unwrap();
        db.aliases().register("seven", &identity(7)).await.unwrap();

        db.members().remove_id(member.id).await.unwrap();

        assert_eq!(
            db.aliases().resolve("seven").await.unwrap().identity,
            identity(7)
        );
    }
}
