//! Member filter specification and SQL statement builder.

use crate::model::MemberId;
use crate::query::page::{Sort, SortField};
use rusqlite::types::Value;

const MEMBER_COLUMNS: &str = "m.id AS id, m.username AS username, m.age AS age, m.team_id AS team_id";

/// Comparison applied to `members.age`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeFilter {
    Equal(i32),
    GreaterThan(i32),
    AtLeast(i32),
    LessThan(i32),
}

impl AgeFilter {
    fn sql(self) -> (&'static str, i32) {
        match self {
            Self::Equal(age) => (" AND m.age = ?", age),
            Self::GreaterThan(age) => (" AND m.age > ?", age),
            Self::AtLeast(age) => (" AND m.age >= ?", age),
            Self::LessThan(age) => (" AND m.age < ?", age),
        }
    }
}

/// Conjunction of optional member predicates. An empty filter matches all rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberFilter {
    pub id: Option<MemberId>,
    /// Exact username match.
    pub username: Option<String>,
    pub age: Option<AgeFilter>,
    /// Username set membership. `Some(empty)` matches nothing.
    pub usernames: Option<Vec<String>>,
}

impl MemberFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: MemberId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn age(mut self, age: AgeFilter) -> Self {
        self.age = Some(age);
        self
    }

    pub fn username_in<I, S>(mut self, usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.usernames = Some(usernames.into_iter().map(Into::into).collect());
        self
    }

    fn push_predicates(&self, sql: &mut String, params: &mut Vec<Value>) {
        sql.push_str(" WHERE 1 = 1");

        if let Some(id) = self.id {
            sql.push_str(" AND m.id = ?");
            params.push(Value::Integer(id));
        }

        if let Some(username) = self.username.as_ref() {
            sql.push_str(" AND m.username = ?");
            params.push(Value::Text(username.clone()));
        }

        if let Some(age) = self.age {
            let (clause, value) = age.sql();
            sql.push_str(clause);
            params.push(Value::Integer(i64::from(value)));
        }

        if let Some(usernames) = self.usernames.as_ref() {
            let placeholders = vec!["?"; usernames.len()].join(", ");
            sql.push_str(&format!(" AND m.username IN ({placeholders})"));
            params.extend(usernames.iter().cloned().map(Value::Text));
        }
    }
}

/// Whether a read materializes each member's team in the same statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fetch {
    /// Members only; teams come back as unloaded references.
    #[default]
    Lazy,
    /// `LEFT JOIN teams`; teams come back loaded.
    Team,
}

/// `LIMIT/OFFSET` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Window {
    pub(crate) limit: u64,
    pub(crate) offset: u64,
}

/// SQL text with positional parameters in bind order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SqlQuery {
    pub(crate) sql: String,
    pub(crate) params: Vec<Value>,
}

/// Builds one member select for `filter`.
pub(crate) fn select_members(
    filter: &MemberFilter,
    fetch: Fetch,
    sort: Option<&Sort>,
    window: Option<Window>,
) -> SqlQuery {
    let mut sql = match fetch {
        Fetch::Lazy => format!("SELECT {MEMBER_COLUMNS} FROM members m"),
        Fetch::Team => format!(
            "SELECT {MEMBER_COLUMNS}, t.name AS team_name
             FROM members m
             LEFT JOIN teams t ON t.id = m.team_id"
        ),
    };
    let mut params = Vec::new();
    filter.push_predicates(&mut sql, &mut params);

    match sort {
        Some(sort) if sort.field != SortField::Id => sql.push_str(&format!(
            " ORDER BY {} {}, m.id ASC",
            sort.field.column(),
            sort.direction.as_sql()
        )),
        Some(sort) => sql.push_str(&format!(" ORDER BY m.id {}", sort.direction.as_sql())),
        None => sql.push_str(" ORDER BY m.id ASC"),
    }

    if let Some(window) = window {
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(Value::Integer(clamp_i64(window.limit)));
        params.push(Value::Integer(clamp_i64(window.offset)));
    }

    sql.push(';');
    SqlQuery { sql, params }
}

/// Builds the count statement matching [`select_members`] for `filter`.
pub(crate) fn count_members(filter: &MemberFilter) -> SqlQuery {
    let mut sql = String::from("SELECT COUNT(*) FROM members m");
    let mut params = Vec::new();
    filter.push_predicates(&mut sql, &mut params);
    sql.push(';');
    SqlQuery { sql, params }
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
