//! SQLite storage bootstrap, schema migration and transaction scope.
//!
//! # Responsibility
//! - Open and configure SQLite connections for roster core.
//! - Apply schema migrations in deterministic order.
//! - Provide the request-scoped transaction helper used by callers.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write members or teams before migrations succeed.

pub mod migrations;
mod open;
mod transaction;

pub use open::{open_db, open_db_in_memory, open_db_with_options, DbOptions};
pub use transaction::with_transaction;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
