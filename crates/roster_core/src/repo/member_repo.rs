//! Member repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, the enumerated derived-filter reads, paging, bulk update,
//!   locked reads and fetch-eager reads over `members`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every read is one statement built by `query::filter`; paged reads add
//!   one count statement over the same predicate.
//! - Bulk updates go straight to the store. Entities read earlier keep their
//!   old values until they are read again.
//! - Locked reads hold the store write lock until the enclosing transaction
//!   ends.

use crate::model::member::{Member, TeamRef};
use crate::model::team::Team;
use crate::model::{EntityError, MemberId, TeamId};
use crate::query::filter::{count_members, select_members, SqlQuery, Window};
use crate::query::{AgeFilter, Fetch, MemberFilter, Page, PageRequest, Slice, Sort};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{ensure_table_ready, MEMBER_COLUMNS};
use log::{debug, info};
use rusqlite::{params, params_from_iter, Connection, Row};
use serde::{Deserialize, Serialize};

/// Flat member projection joined with its team name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDto {
    pub id: MemberId,
    pub username: String,
    pub team_name: Option<String>,
}

impl TryFrom<&Member> for MemberDto {
    type Error = EntityError;

    /// Uses the team name only when the reference is already loaded.
    ///
    /// # Errors
    /// - `EntityError::Transient` for a member that has not been saved.
    fn try_from(member: &Member) -> Result<Self, Self::Error> {
        let id = member
            .id()
            .ok_or(EntityError::Transient { entity: "member" })?;
        Ok(Self {
            id,
            username: member.username().to_string(),
            team_name: member
                .team()
                .and_then(TeamRef::get)
                .map(|team| team.name().to_string()),
        })
    }
}

/// Repository interface for member persistence and queries.
pub trait MemberRepository {
    /// Inserts a new member (assigning its id) or updates an existing one.
    fn save(&self, member: &mut Member) -> RepoResult<MemberId>;
    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>>;
    /// All members, teams unloaded.
    fn find_all(&self) -> RepoResult<Vec<Member>>;
    fn count(&self) -> RepoResult<u64>;
    /// Deletes the member row. Deleting an already-deleted row is a no-op.
    fn delete(&self, member: &Member) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn delete_by_id(&self, id: MemberId) -> RepoResult<bool>;
    fn delete_all(&self) -> RepoResult<usize>;

    /// Runs an arbitrary typed filter as one select.
    fn find_by_filter(
        &self,
        filter: &MemberFilter,
        fetch: Fetch,
        sort: Option<&Sort>,
    ) -> RepoResult<Vec<Member>>;
    /// Counts rows matching `filter` without joining teams.
    fn count_by_filter(&self, filter: &MemberFilter) -> RepoResult<u64>;

    /// `username = ? AND age > ?`.
    fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepoResult<Vec<Member>>;
    /// `username = ? AND age = ?`.
    fn find_by_username_and_age(&self, username: &str, age: i32) -> RepoResult<Vec<Member>>;
    fn find_by_username(&self, username: &str) -> RepoResult<Vec<Member>>;
    /// Single-result lookup; more than one match is `NonUniqueResult`.
    fn find_one_by_username(&self, username: &str) -> RepoResult<Option<Member>>;
    /// `username IN (...)`; an empty set matches nothing.
    fn find_by_usernames(&self, usernames: &[String]) -> RepoResult<Vec<Member>>;
    /// Username column only, in id order.
    fn find_usernames(&self) -> RepoResult<Vec<String>>;
    /// Members that have a team, projected with the team name.
    fn find_member_dtos(&self) -> RepoResult<Vec<MemberDto>>;

    /// Members with `age = ?`, windowed, with a separate total count.
    fn find_page_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Page<Member>>;
    /// Same window as `find_page_by_age` with teams loaded by the data
    /// query. The count query still skips the join.
    fn find_page_by_age_with_team(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> RepoResult<Page<Member>>;
    /// Members with `age = ?`, windowed, without counting.
    fn find_slice_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Slice<Member>>;

    /// `age += 1` for every row with `age >= threshold`, in one statement.
    ///
    /// Returns the number of rows changed. Previously read entities are not
    /// refreshed.
    fn bulk_increment_age(&self, threshold: i32) -> RepoResult<usize>;

    /// Reads members by username while holding the store write lock.
    ///
    /// # Errors
    /// - `LockOutsideTransaction` when the connection is in autocommit mode.
    /// - `LockTimeout` when another transaction holds the lock past the busy
    ///   timeout.
    fn find_for_update(&self, username: &str) -> RepoResult<Vec<Member>>;

    /// All members with their teams loaded in the same statement.
    fn find_all_with_team(&self) -> RepoResult<Vec<Member>>;
    fn find_by_username_with_team(&self, username: &str) -> RepoResult<Vec<Member>>;
}

/// SQLite-backed member repository.
///
/// Built from a `&Transaction`, every call runs inside that transaction.
pub struct SqliteMemberRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMemberRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(conn, "members", MEMBER_COLUMNS)?;
        Ok(Self { conn })
    }

    fn query_members(&self, query: &SqlQuery, fetch: Fetch) -> RepoResult<Vec<Member>> {
        let mut stmt = self.conn.prepare(&query.sql)?;
        let mut rows = stmt.query(params_from_iter(query.params.iter()))?;
        let mut members = Vec::new();
        while let Some(row) = rows.next()? {
            members.push(parse_member_row(row, fetch)?);
        }
        Ok(members)
    }

    fn query_count(&self, query: &SqlQuery) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            &query.sql,
            params_from_iter(query.params.iter()),
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn windowed_by_age(
        &self,
        age: i32,
        request: &PageRequest,
        limit: u64,
        fetch: Fetch,
    ) -> RepoResult<Vec<Member>> {
        let filter = MemberFilter::new().age(AgeFilter::Equal(age));
        let window = Window {
            limit,
            offset: request.offset(),
        };
        let query = select_members(&filter, fetch, request.sort(), Some(window));
        self.query_members(&query, fetch)
    }

    fn page_by_age(
        &self,
        age: i32,
        request: &PageRequest,
        fetch: Fetch,
    ) -> RepoResult<Page<Member>> {
        let content = self.windowed_by_age(age, request, u64::from(request.size()), fetch)?;
        let total = self.count_by_filter(&MemberFilter::new().age(AgeFilter::Equal(age)))?;
        Ok(Page::new(content, request, total))
    }
}

impl MemberRepository for SqliteMemberRepository<'_> {
    fn save(&self, member: &mut Member) -> RepoResult<MemberId> {
        let team_id = member.team_id();
        match member.id() {
            None => {
                self.conn.execute(
                    "INSERT INTO members (username, age, team_id) VALUES (?1, ?2, ?3);",
                    params![member.username(), member.age(), team_id],
                )?;
                let id = self.conn.last_insert_rowid();
                member.assign_id(id);
                debug!("event=member_save module=repo status=ok op=insert member_id={id}");
                Ok(id)
            }
            Some(id) => {
                let changed = self.conn.execute(
                    "UPDATE members
                     SET username = ?2, age = ?3, team_id = ?4
                     WHERE id = ?1;",
                    params![id, member.username(), member.age(), team_id],
                )?;
                if changed == 0 {
                    return Err(RepoError::NotFound {
                        entity: "member",
                        id,
                    });
                }
                debug!("event=member_save module=repo status=ok op=update member_id={id}");
                Ok(id)
            }
        }
    }

    fn find_by_id(&self, id: MemberId) -> RepoResult<Option<Member>> {
        let members = self.find_by_filter(&MemberFilter::new().id(id), Fetch::Lazy, None)?;
        Ok(members.into_iter().next())
    }

    fn find_all(&self) -> RepoResult<Vec<Member>> {
        self.find_by_filter(&MemberFilter::new(), Fetch::Lazy, None)
    }

    fn count(&self) -> RepoResult<u64> {
        self.count_by_filter(&MemberFilter::new())
    }

    fn delete(&self, member: &Member) -> RepoResult<()> {
        let id = member
            .id()
            .ok_or(EntityError::Transient { entity: "member" })?;
        self.delete_by_id(id)?;
        Ok(())
    }

    fn delete_by_id(&self, id: MemberId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM members WHERE id = ?1;", [id])?;
        Ok(changed > 0)
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let changed = self.conn.execute("DELETE FROM members;", [])?;
        info!("event=member_delete_all module=repo status=ok affected={changed}");
        Ok(changed)
    }

    fn find_by_filter(
        &self,
        filter: &MemberFilter,
        fetch: Fetch,
        sort: Option<&Sort>,
    ) -> RepoResult<Vec<Member>> {
        let query = select_members(filter, fetch, sort, None);
        self.query_members(&query, fetch)
    }

    fn count_by_filter(&self, filter: &MemberFilter) -> RepoResult<u64> {
        self.query_count(&count_members(filter))
    }

    fn find_by_username_and_age_greater_than(
        &self,
        username: &str,
        age: i32,
    ) -> RepoResult<Vec<Member>> {
        let filter = MemberFilter::new()
            .username(username)
            .age(AgeFilter::GreaterThan(age));
        self.find_by_filter(&filter, Fetch::Lazy, None)
    }

    fn find_by_username_and_age(&self, username: &str, age: i32) -> RepoResult<Vec<Member>> {
        let filter = MemberFilter::new()
            .username(username)
            .age(AgeFilter::Equal(age));
        self.find_by_filter(&filter, Fetch::Lazy, None)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Vec<Member>> {
        self.find_by_filter(&MemberFilter::new().username(username), Fetch::Lazy, None)
    }

    fn find_one_by_username(&self, username: &str) -> RepoResult<Option<Member>> {
        let mut members = self.find_by_username(username)?;
        if members.len() > 1 {
            return Err(RepoError::NonUniqueResult {
                count: members.len(),
            });
        }
        Ok(members.pop())
    }

    fn find_by_usernames(&self, usernames: &[String]) -> RepoResult<Vec<Member>> {
        let filter = MemberFilter::new().username_in(usernames.iter().cloned());
        self.find_by_filter(&filter, Fetch::Lazy, None)
    }

    fn find_usernames(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username FROM members ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut usernames = Vec::new();
        while let Some(row) = rows.next()? {
            usernames.push(row.get(0)?);
        }
        Ok(usernames)
    }

    fn find_member_dtos(&self) -> RepoResult<Vec<MemberDto>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                m.id AS id,
                m.username AS username,
                t.name AS team_name
             FROM members m
             INNER JOIN teams t ON t.id = m.team_id
             ORDER BY m.id ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut dtos = Vec::new();
        while let Some(row) = rows.next()? {
            dtos.push(MemberDto {
                id: row.get("id")?,
                username: row.get("username")?,
                team_name: Some(row.get("team_name")?),
            });
        }
        Ok(dtos)
    }

    fn find_page_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Page<Member>> {
        self.page_by_age(age, request, Fetch::Lazy)
    }

    fn find_page_by_age_with_team(
        &self,
        age: i32,
        request: &PageRequest,
    ) -> RepoResult<Page<Member>> {
        self.page_by_age(age, request, Fetch::Team)
    }

    fn find_slice_by_age(&self, age: i32, request: &PageRequest) -> RepoResult<Slice<Member>> {
        let rows = self.windowed_by_age(age, request, u64::from(request.size()) + 1, Fetch::Lazy)?;
        Ok(Slice::from_overfetch(rows, request))
    }

    fn bulk_increment_age(&self, threshold: i32) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE members SET age = age + 1 WHERE age >= ?1;",
            [threshold],
        )?;
        info!(
            "event=member_bulk_age_increment module=repo status=ok threshold={threshold} affected={changed}"
        );
        Ok(changed)
    }

    fn find_for_update(&self, username: &str) -> RepoResult<Vec<Member>> {
        if self.conn.is_autocommit() {
            return Err(RepoError::LockOutsideTransaction);
        }

        // A write statement takes the database write lock even when it
        // changes nothing; it stays held until commit or rollback.
        self.conn.execute(
            "UPDATE members SET age = age WHERE username = ?1;",
            [username],
        )?;
        let members = self.find_by_username(username)?;
        debug!(
            "event=member_lock module=repo status=ok rows={}",
            members.len()
        );
        Ok(members)
    }

    fn find_all_with_team(&self) -> RepoResult<Vec<Member>> {
        self.find_by_filter(&MemberFilter::new(), Fetch::Team, None)
    }

    fn find_by_username_with_team(&self, username: &str) -> RepoResult<Vec<Member>> {
        self.find_by_filter(&MemberFilter::new().username(username), Fetch::Team, None)
    }
}

fn parse_member_row(row: &Row<'_>, fetch: Fetch) -> RepoResult<Member> {
    let id: MemberId = row.get("id")?;
    let team_id: Option<TeamId> = row.get("team_id")?;

    let team = match (team_id, fetch) {
        (None, _) => None,
        (Some(team_id), Fetch::Lazy) => Some(TeamRef::Unloaded(team_id)),
        (Some(team_id), Fetch::Team) => {
            let name: Option<String> = row.get("team_name")?;
            let name = name.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "member {id} references missing team {team_id} in members.team_id"
                ))
            })?;
            Some(TeamRef::Loaded(Team::from_row(team_id, name)))
        }
    };

    Ok(Member::from_row(
        id,
        row.get("username")?,
        row.get("age")?,
        team,
    ))
}
