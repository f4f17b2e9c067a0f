//! Team repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist teams and resolve the member/team association from the team
//!   side.
//! - Provide the explicit lazy-load step for `TeamRef::Unloaded`.
//!
//! # Invariants
//! - Deleting a team still referenced by members is rejected by the store
//!   (`ConstraintViolation`); there is no cascade.
//! - A team read from the store starts with an empty member collection until
//!   `load_members` is called.

use crate::model::member::{Member, TeamRef};
use crate::model::team::Team;
use crate::model::{EntityError, MemberId, TeamId};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_table_ready, TEAM_COLUMNS};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row};

/// Repository interface for team persistence.
pub trait TeamRepository {
    /// Inserts a new team (assigning its id) or renames an existing one.
    fn save(&self, team: &mut Team) -> RepoResult<TeamId>;
    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>>;
    fn find_all(&self) -> RepoResult<Vec<Team>>;
    fn count(&self) -> RepoResult<u64>;
    /// Deletes the team row.
    ///
    /// # Errors
    /// - `ConstraintViolation` while members still reference the team.
    fn delete(&self, team: &Team) -> RepoResult<()>;
    fn delete_by_id(&self, id: TeamId) -> RepoResult<bool>;
    fn delete_all(&self) -> RepoResult<usize>;
    /// Replaces `team.members()` with the member ids stored for it.
    fn load_members(&self, team: &mut Team) -> RepoResult<()>;
    /// Resolves the member's team reference with one point lookup.
    ///
    /// Returns `None` for members without a team. An already loaded
    /// reference is returned as is.
    fn load_team<'m>(&self, member: &'m mut Member) -> RepoResult<Option<&'m Team>>;
}

/// SQLite-backed team repository.
pub struct SqliteTeamRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTeamRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "teams", TEAM_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl TeamRepository for SqliteTeamRepository<'_> {
    fn save(&self, team: &mut Team) -> RepoResult<TeamId> {
        let Some(id) = team.id() else {
            self.conn
                .execute("INSERT INTO teams (name) VALUES (?1);", [team.name()])?;
            let id = self.conn.last_insert_rowid();
            team.assign_id(id);
            debug!("event=team_save module=repo status=ok op=insert team_id={id}");
            return Ok(id);
        };

        let changed = self.conn.execute(
            "UPDATE teams SET name = ?2 WHERE id = ?1;",
            params![id, team.name()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "team", id });
        }
        debug!("event=team_save module=repo status=ok op=update team_id={id}");
        Ok(id)
    }

    fn find_by_id(&self, id: TeamId) -> RepoResult<Option<Team>> {
        let team = self
            .conn
            .query_row(
                "SELECT id, name FROM teams WHERE id = ?1;",
                [id],
                parse_team_row,
            )
            .optional()?;
        Ok(team)
    }

    fn find_all(&self) -> RepoResult<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM teams ORDER BY id ASC;")?;
        let teams = stmt
            .query_map([], parse_team_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(teams)
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM teams;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn delete(&self, team: &Team) -> RepoResult<()> {
        let id = team.id().ok_or(EntityError::Transient { entity: "team" })?;
        self.delete_by_id(id)?;
        Ok(())
    }

    fn delete_by_id(&self, id: TeamId) -> RepoResult<bool> {
        let changed = self.conn.execute("DELETE FROM teams WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM teams;", [])?;
        info!("event=team_delete_all module=repo status=ok affected={changed}");
        Ok(changed)
    }

    fn load_members(&self, team: &mut Team) -> RepoResult<()> {
        let id = team.id().ok_or(EntityError::Transient { entity: "team" })?;
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM members WHERE team_id = ?1 ORDER BY id ASC;")?;
        let members = stmt
            .query_map([id], |row| row.get::<_, MemberId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        team.replace_members(members);
        Ok(())
    }

    fn load_team<'m>(&self, member: &'m mut Member) -> RepoResult<Option<&'m Team>> {
        let Some(team_ref) = member.team_ref_mut() else {
            return Ok(None);
        };

        if let TeamRef::Unloaded(team_id) = *team_ref {
            let team = self.find_by_id(team_id)?.ok_or(RepoError::NotFound {
                entity: "team",
                id: team_id,
            })?;
            *team_ref = TeamRef::Loaded(team);
            debug!("event=team_load module=repo status=ok team_id={team_id}");
        }

        Ok(team_ref.get())
    }
}

fn parse_team_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team::from_row(row.get(0)?, row.get(1)?))
}
