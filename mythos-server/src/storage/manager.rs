//! Pooled sqlite handle shared by the repositories.

use std::path::Path;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use super::StorageError;

const SCHEMA_VERSION: i64 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

pub struct Db {
    pool: Pool<SqliteConnectionManager>,
}

impl Db {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = Pool::builder().max_size(8).build(manager)?;
        Ok(Self { pool })
    }

    pub fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        Ok(self.pool.get()?)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA_SQL)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at)
             VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    /// Verify the database is reachable and responding.
    pub fn health_check(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn migrations_record_schema_version() {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("test.db")).unwrap();
        db.run_migrations().unwrap();

        let conn = db.conn().unwrap();
        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_version", params![], |row| row.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let db = Db::open(dir.path().join("test.db")).unwrap();
        db.run_migrations().unwrap();
        db.run_migrations().unwrap();
        db.health_check().unwrap();
    }
}
