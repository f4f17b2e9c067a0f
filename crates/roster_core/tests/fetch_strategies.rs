use roster_core::db::open_db_in_memory;
use roster_core::{
    EntityError, Member, MemberDto, MemberRepository, PageRequest, RepoError, Sort, SortField,
    SqliteMemberRepository, SqliteTeamRepository, Team, TeamRef, TeamRepository,
};
use rusqlite::Connection;

/// member1 -> teamA, member2 -> teamB, member3 without team.
fn seed(conn: &Connection) -> (Team, Team) {
    let members = SqliteMemberRepository::try_new(conn).unwrap();
    let teams = SqliteTeamRepository::try_new(conn).unwrap();

    let mut team_a = Team::new("teamA");
    let mut team_b = Team::new("teamB");
    teams.save(&mut team_a).unwrap();
    teams.save(&mut team_b).unwrap();

    for (username, team) in [("member1", &mut team_a), ("member2", &mut team_b)] {
        let mut member = Member::new(username, 10);
        members.save(&mut member).unwrap();
        member.change_team(team).unwrap();
        members.save(&mut member).unwrap();
    }
    members.save(&mut Member::new("member3", 10)).unwrap();

    (team_a, team_b)
}

#[test]
fn lazy_reads_return_unloaded_references() {
    let conn = open_db_in_memory().unwrap();
    let (team_a, _) = seed(&conn);
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let all = members.find_all().unwrap();
    let first = all[0].team().unwrap();
    assert!(!first.is_loaded());
    assert!(first.get().is_none());
    assert_eq!(first.id(), team_a.id().unwrap());
    assert!(all[2].team().is_none());
}

#[test]
fn load_team_resolves_unloaded_reference() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let members = SqliteMemberRepository::try_new(&conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut member = members.find_by_username("member2").unwrap().remove(0);
    let team = teams.load_team(&mut member).unwrap().unwrap();
    assert_eq!(team.name(), "teamB");
    assert!(member.team().unwrap().is_loaded());

    let mut loner = members.find_by_username("member3").unwrap().remove(0);
    assert!(teams.load_team(&mut loner).unwrap().is_none());
}

#[test]
fn load_team_on_loaded_reference_does_not_touch_the_store() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let members = SqliteMemberRepository::try_new(&conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut member = members.find_by_username_with_team("member1").unwrap().remove(0);
    conn.execute("UPDATE teams SET name = 'renamed';", []).unwrap();

    let team = teams.load_team(&mut member).unwrap().unwrap();
    assert_eq!(team.name(), "teamA");
}

#[test]
fn fetch_eager_loads_all_teams_in_one_read() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let all = members.find_all_with_team().unwrap();
    assert_eq!(all.len(), 3);

    let names: Vec<Option<&str>> = all
        .iter()
        .map(|member| member.team().and_then(TeamRef::get).map(Team::name))
        .collect();
    assert_eq!(names, vec![Some("teamA"), Some("teamB"), None]);
    assert!(all[..2].iter().all(|member| member.team().unwrap().is_loaded()));

    let dto = MemberDto::try_from(&all[0]).unwrap();
    assert_eq!(dto.team_name.as_deref(), Some("teamA"));
}

#[test]
fn lazy_and_eager_reads_describe_the_same_members() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let lazy = members.find_all().unwrap();
    let eager = members.find_all_with_team().unwrap();
    assert_eq!(lazy, eager);

    let lazy_dto = MemberDto::try_from(&lazy[0]).unwrap();
    assert_eq!(lazy_dto.team_name, None);
}

#[test]
fn load_team_for_missing_row_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let members = SqliteMemberRepository::try_new(&conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut member = members.find_by_username("member1").unwrap().remove(0);
    conn.execute_batch(
        "PRAGMA foreign_keys = OFF;
         DELETE FROM teams WHERE name = 'teamA';
         PRAGMA foreign_keys = ON;",
    )
    .unwrap();

    let err = teams.load_team(&mut member).unwrap_err();
    assert!(matches!(err, RepoError::NotFound { entity: "team", .. }));
    assert!(!member.team().unwrap().is_loaded());
}

#[test]
fn eager_page_loads_teams_and_keeps_total() {
    let conn = open_db_in_memory().unwrap();
    seed(&conn);
    let members = SqliteMemberRepository::try_new(&conn).unwrap();

    let request = PageRequest::of(0, 2)
        .unwrap()
        .with_sort(Sort::asc(SortField::Username));
    let page = members.find_page_by_age_with_team(10, &request).unwrap();

    assert_eq!(page.total_elements(), 3);
    assert_eq!(page.total_pages(), 2);
    let names: Vec<Option<&str>> = page
        .content()
        .iter()
        .map(|member| member.team().and_then(TeamRef::get).map(Team::name))
        .collect();
    assert_eq!(names, vec![Some("teamA"), Some("teamB")]);
    assert!(page
        .content()
        .iter()
        .all(|member| member.team().unwrap().is_loaded()));

    let lazy = members.find_page_by_age(10, &request).unwrap();
    assert_eq!(lazy.content(), page.content());
    assert!(!lazy.content()[0].team().unwrap().is_loaded());
}

#[test]
fn dto_conversion_rejects_unsaved_member() {
    let err = MemberDto::try_from(&Member::new("member1", 10)).unwrap_err();
    assert_eq!(err, EntityError::Transient { entity: "member" });
}
