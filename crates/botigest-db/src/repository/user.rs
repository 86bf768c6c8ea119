//! # User Repository
//!
//! Local accounts with sha256-hex password hashes. A seed migration
//! guarantees at least one admin exists; ticket approvals arriving from
//! the Telegram gateway are attributed to that account.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{StoreError, StoreResult};
use botigest_core::auth::{hash_password, verify_password};
use botigest_core::User;

/// Repository for user operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates a user, hashing the plaintext password.
    pub async fn create(&self, username: &str, password: &str, role: &str) -> StoreResult<User> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::Conflict(
                "username and password are required".to_string(),
            ));
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(username)
        .bind(hash_password(password))
        .bind(role)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        info!(user_id = id, username, role, "user created");

        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("User", id))
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by username.
    pub async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// The admin account (lowest id wins). The seed migration guarantees
    /// one exists, so a miss here means the database was tampered with.
    pub async fn find_admin(&self) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE role = 'admin' ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or_else(|| StoreError::not_found("User", "admin"))
    }

    /// Checks credentials. `Ok(None)` for unknown user or wrong password,
    /// indistinguishable on purpose.
    pub async fn authenticate(&self, username: &str, password: &str) -> StoreResult<Option<User>> {
        let user = self.find_by_username(username).await?;

        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    /// All users, oldest first.
    pub async fn list(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn seeded_admin_authenticates_with_default_password() {
        let db = db().await;

        let admin = db.users().find_admin().await.unwrap();
        assert_eq!(admin.username, "admin");

        let ok = db.users().authenticate("admin", "admin123").await.unwrap();
        assert!(ok.is_some());

        let bad = db.users().authenticate("admin", "wrong").await.unwrap();
        assert!(bad.is_none());

        let unknown = db.users().authenticate("ghost", "admin123").await.unwrap();
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn create_hashes_password() {
        let db = db().await;

        let user = db.users().create("cajera", "secreto", "user").await.unwrap();
        assert_ne!(user.password_hash, "secreto");
        assert_eq!(user.password_hash.len(), 64); // sha256 hex

        let ok = db.users().authenticate("cajera", "secreto").await.unwrap();
        assert_eq!(ok.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn duplicate_username_is_unique_violation() {
        let db = db().await;
        db.users().create("cajera", "a", "user").await.unwrap();

        let err = db.users().create("cajera", "b", "user").await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }), "{err}");
    }
}
