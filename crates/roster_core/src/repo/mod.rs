//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for members and teams.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repositories are constructed only over migrated connections.
//! - Repository APIs return semantic errors (`NotFound`, `LockTimeout`,
//!   `ConstraintViolation`) in addition to DB transport errors.

pub mod error;
pub mod member_repo;
mod schema;
pub mod team_repo;

pub use error::{RepoError, RepoResult};
pub use member_repo::{MemberDto, MemberRepository, SqliteMemberRepository};
pub use team_repo::{SqliteTeamRepository, TeamRepository};
