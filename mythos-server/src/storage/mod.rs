mod accounts;
mod manager;
mod state_store;
mod users;

use thiserror::Error;

pub use accounts::AccountRepository;
pub use manager::Db;
pub use state_store::SqliteStateStore;
pub use users::UserRepository;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("blocking task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::Join(err.to_string())
    }
}
