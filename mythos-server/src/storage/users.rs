use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;
use uuid::Uuid;

use super::{Db, StorageError};
use crate::models::User;

/// Fixed identity of the shared demo user, created on first use.
pub const DEMO_USERNAME: &str = "demo_user";
pub const DEMO_EMAIL: &str = "demo@mythos.local";
pub const DEMO_API_TOKEN: &str = "demo_api_token";

pub struct UserRepository {
    db: Arc<Db>,
}

impl UserRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<User>, StorageError> {
        let db = Arc::clone(&self.db);
        let token = token.to_string();

        task::spawn_blocking(move || -> Result<Option<User>, StorageError> {
            let conn = db.conn()?;
            let found = conn
                .query_row(
                    "SELECT id, email, username, api_token, is_demo, created_at
                     FROM users WHERE api_token = ?1",
                    params![token],
                    map_user_row,
                )
                .optional()?;
            Ok(found)
        })
        .await?
    }

    /// Return the shared demo user, creating it if this is the first
    /// fallback.
    pub async fn get_or_create_demo_user(&self) -> Result<User, StorageError> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<User, StorageError> {
            let conn = db.conn()?;
            conn.execute(
                "INSERT OR IGNORE INTO users (id, email, username, api_token, is_demo, created_at)
                 VALUES (?1, ?2, ?3, ?4, 1, ?5)",
                params![
                    Uuid::new_v4().to_string(),
                    DEMO_EMAIL,
                    DEMO_USERNAME,
                    DEMO_API_TOKEN,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            let user = conn.query_row(
                "SELECT id, email, username, api_token, is_demo, created_at
                 FROM users WHERE username = ?1",
                params![DEMO_USERNAME],
                map_user_row,
            )?;
            Ok(user)
        })
        .await?
    }

    /// Register a user with a bearer credential.
    pub async fn create(
        &self,
        email: &str,
        username: &str,
        api_token: &str,
    ) -> Result<User, StorageError> {
        let db = Arc::clone(&self.db);
        let email = email.to_string();
        let username = username.to_string();
        let api_token = api_token.to_string();

        task::spawn_blocking(move || -> Result<User, StorageError> {
            let conn = db.conn()?;
            let user = User {
                id: Uuid::new_v4().to_string(),
                email,
                username,
                api_token: Some(api_token),
                is_demo: false,
                created_at: Utc::now(),
            };
            conn.execute(
                "INSERT INTO users (id, email, username, api_token, is_demo, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                params![
                    user.id,
                    user.email,
                    user.username,
                    user.api_token,
                    user.created_at.to_rfc3339(),
                ],
            )?;
            Ok(user)
        })
        .await?
    }
}

fn map_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let created_at: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        api_token: row.get(3)?,
        is_demo: row.get::<_, i64>(4)? != 0,
        created_at: created_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn repo() -> (TempDir, UserRepository) {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("test.db")).unwrap();
        db.run_migrations().unwrap();
        (dir, UserRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn demo_user_is_created_once() {
        let (_dir, repo) = repo();

        let first = repo.get_or_create_demo_user().await.unwrap();
        let second = repo.get_or_create_demo_user().await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(first.is_demo);
        assert_eq!(first.username, DEMO_USERNAME);
    }

    #[tokio::test]
    async fn finds_users_by_token() {
        let (_dir, repo) = repo();

        let created = repo
            .create("alice@example.com", "alice", "token-abc")
            .await
            .unwrap();

        let found = repo.find_by_token("token-abc").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(!found.is_demo);

        assert!(repo.find_by_token("unknown").await.unwrap().is_none());
    }
}
