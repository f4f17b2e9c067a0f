//! Core persistence layer for the member/team roster.
//! Entities, repositories and the query executor live here; callers own the
//! connection and the transaction scope.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod service;

pub use config::{ConfigError, RosterConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::member::{Member, TeamRef};
pub use model::team::Team;
pub use model::{EntityError, MemberId, TeamId};
pub use query::{
    AgeFilter, Direction, Fetch, MemberFilter, Page, PageRequest, QueryError, Slice, Sort,
    SortField,
};
pub use repo::{
    MemberDto, MemberRepository, RepoError, RepoResult, SqliteMemberRepository,
    SqliteTeamRepository, TeamRepository,
};
pub use service::{RosterService, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
