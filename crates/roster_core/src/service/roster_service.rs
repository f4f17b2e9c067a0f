//! Roster use-case service.
//!
//! # Responsibility
//! - Provide the member/team use cases on top of the two repositories.
//! - Translate missing rows into use-case errors.
//!
//! # Invariants
//! - The association is changed only through `Member::change_team`, then
//!   persisted from the member side.
//! - Service layer stays storage-agnostic; transaction scope belongs to the
//!   caller (`db::with_transaction`).

use crate::model::member::Member;
use crate::model::team::Team;
use crate::model::{EntityError, MemberId, TeamId};
use crate::query::{Page, PageRequest};
use crate::repo::{MemberDto, MemberRepository, RepoError, TeamRepository};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from roster use cases.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("member not found: {0}")]
    MemberNotFound(MemberId),
    #[error("team not found: {0}")]
    TeamNotFound(TeamId),
    #[error(transparent)]
    Entity(#[from] EntityError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Use-case service over member and team repositories.
pub struct RosterService<M: MemberRepository, T: TeamRepository> {
    members: M,
    teams: T,
}

impl<M: MemberRepository, T: TeamRepository> RosterService<M, T> {
    pub fn new(members: M, teams: T) -> Self {
        Self { members, teams }
    }

    /// Persists a new member without a team.
    pub fn register_member(&self, username: impl Into<String>, age: i32) -> ServiceResult<Member> {
        let mut member = Member::new(username, age);
        self.members.save(&mut member)?;
        Ok(member)
    }

    /// Persists a new empty team.
    pub fn create_team(&self, name: impl Into<String>) -> ServiceResult<Team> {
        let mut team = Team::new(name);
        self.teams.save(&mut team)?;
        Ok(team)
    }

    /// Moves a stored member into a stored team.
    ///
    /// # Contract
    /// - Returns the updated member with its team loaded.
    /// - The team's member collection is refreshed from the store before the
    ///   move, so it reflects every member after the call.
    pub fn assign_team(&self, member_id: MemberId, team_id: TeamId) -> ServiceResult<Member> {
        let mut member = self
            .members
            .find_by_id(member_id)?
            .ok_or(ServiceError::MemberNotFound(member_id))?;
        let mut team = self
            .teams
            .find_by_id(team_id)?
            .ok_or(ServiceError::TeamNotFound(team_id))?;

        self.teams.load_members(&mut team)?;
        member.change_team(&mut team)?;
        self.members.save(&mut member)?;
        Ok(member)
    }

    /// Pages members of `age` as flat projections with team names.
    ///
    /// Teams come from the page's own data query; there is no per-row team
    /// lookup.
    pub fn members_page(&self, age: i32, request: &PageRequest) -> ServiceResult<Page<MemberDto>> {
        let page = self.members.find_page_by_age_with_team(age, request)?;
        let dtos = page
            .content()
            .iter()
            .map(MemberDto::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(dtos, request, page.total_elements()))
    }

    /// Increments the age of every member aged `threshold` or older.
    pub fn increment_ages_from(&self, threshold: i32) -> ServiceResult<usize> {
        Ok(self.members.bulk_increment_age(threshold)?)
    }
}
