use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use tokio::task;
use uuid::Uuid;

use super::{Db, StorageError};
use crate::models::AccountSummary;

/// Linked Twitter accounts. Credentials arrive and leave this layer as
/// opaque encrypted blobs; decryption is the caller's concern.
pub struct AccountRepository {
    db: Arc<Db>,
}

impl AccountRepository {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }

    /// Link an account, keyed by `(user_id, twitter_username)`. Re-linking
    /// an existing account refreshes its credentials and re-activates it.
    pub async fn upsert(
        &self,
        user_id: &str,
        twitter_username: &str,
        access_token: Vec<u8>,
        access_token_secret: Vec<u8>,
    ) -> Result<AccountSummary, StorageError> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let twitter_username = twitter_username.to_string();

        task::spawn_blocking(move || -> Result<AccountSummary, StorageError> {
            let conn = db.conn()?;
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO twitter_accounts
                     (id, user_id, twitter_username, access_token, access_token_secret,
                      is_active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)
                 ON CONFLICT (user_id, twitter_username) DO UPDATE SET
                     access_token = excluded.access_token,
                     access_token_secret = excluded.access_token_secret,
                     is_active = 1,
                     updated_at = excluded.updated_at",
                params![
                    Uuid::new_v4().to_string(),
                    user_id,
                    twitter_username,
                    access_token,
                    access_token_secret,
                    now,
                ],
            )?;
            let summary = conn.query_row(
                "SELECT id, twitter_username, is_active, created_at
                 FROM twitter_accounts
                 WHERE user_id = ?1 AND twitter_username = ?2",
                params![user_id, twitter_username],
                map_summary_row,
            )?;
            Ok(summary)
        })
        .await?
    }

    pub async fn list_active(&self, user_id: &str) -> Result<Vec<AccountSummary>, StorageError> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<AccountSummary>, StorageError> {
            let conn = db.conn()?;
            let mut stmt = conn.prepare(
                "SELECT id, twitter_username, is_active, created_at
                 FROM twitter_accounts
                 WHERE user_id = ?1 AND is_active = 1
                 ORDER BY created_at",
            )?;
            let accounts = stmt
                .query_map(params![user_id], map_summary_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(accounts)
        })
        .await?
    }

    /// Unlink an account. Scoped to the owner so a user cannot remove
    /// someone else's link. Returns whether a row was removed.
    pub async fn delete(&self, user_id: &str, account_id: &str) -> Result<bool, StorageError> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let account_id = account_id.to_string();

        task::spawn_blocking(move || -> Result<bool, StorageError> {
            let conn = db.conn()?;
            let removed = conn.execute(
                "DELETE FROM twitter_accounts WHERE id = ?1 AND user_id = ?2",
                params![account_id, user_id],
            )?;
            Ok(removed > 0)
        })
        .await?
    }
}

fn map_summary_row(row: &Row<'_>) -> rusqlite::Result<AccountSummary> {
    let created_at: String = row.get(3)?;
    Ok(AccountSummary {
        id: row.get(0)?,
        twitter_username: row.get(1)?,
        is_active: row.get::<_, i64>(2)? != 0,
        created_at: created_at
            .parse::<DateTime<Utc>>()
            .unwrap_or_else(|_| Utc::now()),
    })
}
