//! Member entity and its explicit team reference.
//!
//! # Invariants
//! - After `change_team(t)`, `t.members()` contains this member exactly once.
//! - `team` has no public setter; the link is changed from this side only.
//! - A `TeamRef` never loads itself; see `TeamRepository::load_team`.

use crate::model::team::Team;
use crate::model::{EntityError, MemberId, TeamId};

/// Two-state reference from a member to its team.
#[derive(Debug, Clone)]
pub enum TeamRef {
    /// Only the foreign key is known. Produced by lazy reads.
    Unloaded(TeamId),
    /// The team row was materialized alongside the member.
    Loaded(Team),
}

impl TeamRef {
    /// Foreign key of the referenced team, available in both states.
    pub fn id(&self) -> TeamId {
        match self {
            Self::Unloaded(id) => *id,
            // Loaded teams always come from the store or from `change_team`,
            // both of which require an id.
            Self::Loaded(team) => team.id().unwrap_or_default(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Returns the team when already loaded. Never touches the store.
    pub fn get(&self) -> Option<&Team> {
        match self {
            Self::Loaded(team) => Some(team),
            Self::Unloaded(_) => None,
        }
    }
}

/// References are equal when they point at the same row, whatever their
/// load state.
impl PartialEq for TeamRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for TeamRef {}

/// A member, optionally belonging to one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    id: Option<MemberId>,
    username: String,
    age: i32,
    team: Option<TeamRef>,
}

impl Member {
    /// Creates an unsaved member without a team.
    pub fn new(username: impl Into<String>, age: i32) -> Self {
        Self {
            id: None,
            username: username.into(),
            age,
            team: None,
        }
    }

    /// Creates an unsaved member with age `0`.
    pub fn named(username: impl Into<String>) -> Self {
        Self::new(username, 0)
    }

    pub(crate) fn from_row(
        id: MemberId,
        username: String,
        age: i32,
        team: Option<TeamRef>,
    ) -> Self {
        Self {
            id: Some(id),
            username,
            age,
            team,
        }
    }

    pub fn id(&self) -> Option<MemberId> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn team(&self) -> Option<&TeamRef> {
        self.team.as_ref()
    }

    pub fn team_id(&self) -> Option<TeamId> {
        self.team.as_ref().map(TeamRef::id)
    }

    pub fn change_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn change_age(&mut self, age: i32) {
        self.age = age;
    }

    /// Moves this member into `team`, updating both sides.
    ///
    /// Idempotent: calling it again with the same team keeps a single entry
    /// in the team's collection. The previously referenced team snapshot is
    /// not reachable from here and keeps whatever it held.
    ///
    /// # Errors
    /// - `EntityError::Transient` when either entity has no id yet. Nothing
    ///   is modified in that case.
    pub fn change_team(&mut self, team: &mut Team) -> Result<(), EntityError> {
        let member_id = self
            .id
            .ok_or(EntityError::Transient { entity: "member" })?;
        if team.id().is_none() {
            return Err(EntityError::Transient { entity: "team" });
        }

        team.attach_member(member_id);
        self.team = Some(TeamRef::Loaded(team.clone()));
        Ok(())
    }

    /// Removes the association with `team` on both sides.
    ///
    /// # Errors
    /// - `EntityError::Transient` when this member has no id.
    /// - `EntityError::NotTeamMember` when the member does not reference `team`.
    pub fn leave_team(&mut self, team: &mut Team) -> Result<(), EntityError> {
        let member_id = self
            .id
            .ok_or(EntityError::Transient { entity: "member" })?;
        let team_id = team.id().ok_or(EntityError::Transient { entity: "team" })?;
        if self.team_id() != Some(team_id) {
            return Err(EntityError::NotTeamMember { member_id, team_id });
        }

        team.detach_member(member_id);
        self.team = None;
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: MemberId) {
        self.id = Some(id);
    }

    pub(crate) fn team_ref_mut(&mut self) -> Option<&mut TeamRef> {
        self.team.as_mut()
    }
}
