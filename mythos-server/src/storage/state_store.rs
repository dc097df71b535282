//! Sqlite-backed pending-authorization store used on the live OAuth path.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row, TransactionBehavior};
use tokio::task;

use super::{Db, StorageError};
use crate::models::PendingAuthorization;
use crate::services::state_store::{StateStore, StoreError};

impl From<StorageError> for StoreError {
    fn from(err: StorageError) -> Self {
        StoreError(err.to_string())
    }
}

pub struct SqliteStateStore {
    db: Arc<Db>,
}

impl SqliteStateStore {
    pub fn new(db: Arc<Db>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn put(&self, pending: PendingAuthorization) -> Result<(), StoreError> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<(), StorageError> {
            let conn = db.conn()?;
            conn.execute(
                "INSERT OR REPLACE INTO oauth_states
                     (state, user_id, request_token, request_secret, callback_url, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    pending.state,
                    pending.user_id,
                    pending.request_token,
                    pending.request_secret,
                    pending.callback_url,
                    pending.expires_at.timestamp(),
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(StorageError::from)??;
        Ok(())
    }

    async fn get(&self, state: &str) -> Result<Option<PendingAuthorization>, StoreError> {
        let db = Arc::clone(&self.db);
        let state = state.to_string();

        let found = task::spawn_blocking(
            move || -> Result<Option<PendingAuthorization>, StorageError> {
                let conn = db.conn()?;
                let found = conn
                    .query_row(
                        "SELECT state, user_id, request_token, request_secret,
                                callback_url, expires_at
                         FROM oauth_states WHERE state = ?1",
                        params![state],
                        map_pending_row,
                    )
                    .optional()?;
                Ok(found)
            },
        )
        .await
        .map_err(StorageError::from)??;
        Ok(found)
    }

    async fn take(&self, state: &str) -> Result<Option<PendingAuthorization>, StoreError> {
        let db = Arc::clone(&self.db);
        let state = state.to_string();

        // The read and the delete must be one atomic step so that of two
        // completions racing on the same state, exactly one wins.
        let taken = task::spawn_blocking(
            move || -> Result<Option<PendingAuthorization>, StorageError> {
                let mut conn = db.conn()?;
                let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

                let found = tx
                    .query_row(
                        "SELECT state, user_id, request_token, request_secret,
                                callback_url, expires_at
                         FROM oauth_states WHERE state = ?1",
                        params![state],
                        map_pending_row,
                    )
                    .optional()?;

                if found.is_some() {
                    tx.execute("DELETE FROM oauth_states WHERE state = ?1", params![state])?;
                }
                tx.commit()?;
                Ok(found)
            },
        )
        .await
        .map_err(StorageError::from)??;
        Ok(taken)
    }

    async fn remove(&self, state: &str) -> Result<(), StoreError> {
        let db = Arc::clone(&self.db);
        let state = state.to_string();

        task::spawn_blocking(move || -> Result<(), StorageError> {
            let conn = db.conn()?;
            conn.execute("DELETE FROM oauth_states WHERE state = ?1", params![state])?;
            Ok(())
        })
        .await
        .map_err(StorageError::from)??;
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let db = Arc::clone(&self.db);
        let cutoff = Utc::now().timestamp();

        let swept = task::spawn_blocking(move || -> Result<usize, StorageError> {
            let conn = db.conn()?;
            let swept =
                conn.execute("DELETE FROM oauth_states WHERE expires_at <= ?1", params![cutoff])?;
            Ok(swept)
        })
        .await
        .map_err(StorageError::from)??;
        Ok(swept)
    }

    async fn len(&self) -> Result<usize, StoreError> {
        let db = Arc::clone(&self.db);

        let count = task::spawn_blocking(move || -> Result<usize, StorageError> {
            let conn = db.conn()?;
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM oauth_states", params![], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
        .map_err(StorageError::from)??;
        Ok(count)
    }
}

fn map_pending_row(row: &Row<'_>) -> rusqlite::Result<PendingAuthorization> {
    let expires_at: i64 = row.get(5)?;
    Ok(PendingAuthorization {
        state: row.get(0)?,
        user_id: row.get(1)?,
        request_token: row.get(2)?,
        request_secret: row.get(3)?,
        callback_url: row.get(4)?,
        expires_at: DateTime::<Utc>::from_timestamp(expires_at, 0).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, SqliteStateStore) {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("test.db")).unwrap();
        db.run_migrations().unwrap();
        (dir, SqliteStateStore::new(Arc::new(db)))
    }

    fn pending(state: &str, ttl_seconds: i64) -> PendingAuthorization {
        PendingAuthorization {
            state: state.to_string(),
            user_id: "user-1".to_string(),
            request_token: "req-token".to_string(),
            request_secret: "req-secret".to_string(),
            callback_url: "https://app.example/callback".to_string(),
            expires_at: Utc::now() + Duration::seconds(ttl_seconds),
        }
    }

    #[tokio::test]
    async fn round_trips_a_pending_authorization() {
        let (_dir, store) = store();
        store.put(pending("s1", 600)).await.unwrap();

        let found = store.get("s1").await.unwrap().unwrap();
        assert_eq!(found.user_id, "user-1");
        assert_eq!(found.request_token, "req-token");
        assert_eq!(found.callback_url, "https://app.example/callback");
    }

    #[tokio::test]
    async fn take_consumes_exactly_once() {
        let (_dir, store) = store();
        store.put(pending("s1", 600)).await.unwrap();

        assert!(store.take("s1").await.unwrap().is_some());
        assert!(store.take("s1").await.unwrap().is_none());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn sweep_removes_expired_rows_only() {
        let (_dir, store) = store();
        store.put(pending("live", 600)).await.unwrap();
        store.put(pending("stale", -5)).await.unwrap();

        let swept = store.sweep_expired().await.unwrap();

        assert_eq!(swept, 1);
        assert!(store.get("live").await.unwrap().is_some());
        assert!(store.get("stale").await.unwrap().is_none());
    }
}
