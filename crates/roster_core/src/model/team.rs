//! Team entity.

use crate::model::{MemberId, TeamId};

/// A team that members can belong to.
///
/// The member collection holds back references only. A team never creates,
/// saves or deletes its members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    id: Option<TeamId>,
    name: String,
    members: Vec<MemberId>,
}

impl Team {
    /// Creates an unsaved team with an empty member collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub(crate) fn from_row(id: TeamId, name: String) -> Self {
        Self {
            id: Some(id),
            name,
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<TeamId> {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Member ids known to this in-memory snapshot.
    ///
    /// Populated by `Member::change_team` or replaced from the store by
    /// `TeamRepository::load_members`. A freshly read team starts empty.
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    pub fn change_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub(crate) fn assign_id(&mut self, id: TeamId) {
        self.id = Some(id);
    }

    /// Adds `member_id` unless already present.
    pub(crate) fn attach_member(&mut self, member_id: MemberId) {
        if !self.members.contains(&member_id) {
            self.members.push(member_id);
        }
    }

    pub(crate) fn detach_member(&mut self, member_id: MemberId) {
        self.members.retain(|id| *id != member_id);
    }

    pub(crate) fn replace_members(&mut self, members: Vec<MemberId>) {
        self.members = members;
    }
}
