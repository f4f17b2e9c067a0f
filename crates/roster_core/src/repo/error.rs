//! Repository error type and SQLite failure classification.
//!
//! SQLite failures are mapped to semantic variants where callers need to
//! react differently (lock contention, constraint violations); everything
//! else stays a transport-level `Db` error.

use crate::db::DbError;
use crate::model::EntityError;
use crate::query::QueryError;
use rusqlite::ErrorCode;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from member/team repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// Underlying SQLite or bootstrap failure.
    #[error(transparent)]
    Db(#[from] DbError),
    /// Target row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },
    /// Entity state does not allow the operation (e.g. unsaved).
    #[error(transparent)]
    Entity(#[from] EntityError),
    /// Query specification rejected before reaching the store.
    #[error(transparent)]
    InvalidQuery(#[from] QueryError),
    /// Persisted data cannot be converted to a valid entity.
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    #[error("repository requires schema version {expected_version}, got {actual_version}")]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("repository requires table `{0}`")]
    MissingRequiredTable(&'static str),
    #[error("repository requires column `{column}` in table `{table}`")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Foreign key, NOT NULL or uniqueness rule rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    /// A competing transaction held the write lock past the busy timeout.
    #[error("lock not acquired before busy timeout: {0}")]
    LockTimeout(String),
    /// A locked read was attempted in autocommit mode.
    #[error("locked reads require an enclosing transaction")]
    LockOutsideTransaction,
    /// A single-result query matched more than one row.
    #[error("expected at most one result, got {count}")]
    NonUniqueResult { count: usize },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(failure, _) => match failure.code {
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    Self::LockTimeout(value.to_string())
                }
                ErrorCode::ConstraintViolation => Self::ConstraintViolation(value.to_string()),
                _ => Self::Db(DbError::Sqlite(value)),
            },
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}
