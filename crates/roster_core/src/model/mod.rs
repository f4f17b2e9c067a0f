//! Member/team domain model.
//!
//! # Responsibility
//! - Define the persisted entities and their association.
//! - Keep the member/team link consistent on both sides in memory.
//!
//! # Invariants
//! - Entities carry `id = None` until saved; the store generates ids.
//! - The association is mutated only through `Member::change_team` and
//!   `Member::leave_team`.

pub mod member;
pub mod team;

/// Surrogate key of a persisted member row.
pub type MemberId = i64;
/// Surrogate key of a persisted team row.
pub type TeamId = i64;

/// Errors raised by entity-level mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// The operation needs a saved entity but got one without identity.
    #[error("{entity} has not been saved yet")]
    Transient { entity: &'static str },
    /// `leave_team` was called with a team the member does not belong to.
    #[error("member {member_id} does not belong to team {team_id}")]
    NotTeamMember { member_id: MemberId, team_id: TeamId },
}
