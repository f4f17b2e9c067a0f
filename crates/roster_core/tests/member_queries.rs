use roster_core::db::open_db_in_memory;
use roster_core::{
    AgeFilter, Fetch, Member, MemberDto, MemberFilter, MemberRepository, PageRequest, RepoError,
    Sort, SortField, SqliteMemberRepository, SqliteTeamRepository, Team, TeamRepository,
};
use rusqlite::Connection;

fn seed(repo: &SqliteMemberRepository<'_>, rows: &[(&str, i32)]) -> Vec<Member> {
    rows.iter()
        .map(|(username, age)| {
            let mut member = Member::new(*username, *age);
            repo.save(&mut member).unwrap();
            member
        })
        .collect()
}

fn usernames(members: &[Member]) -> Vec<&str> {
    members.iter().map(Member::username).collect()
}

#[test]
fn username_and_age_greater_than() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("AAA", 10), ("AAA", 20)]);

    let result = repo
        .find_by_username_and_age_greater_than("AAA", 15)
        .unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].username(), "AAA");
    assert_eq!(result[0].age(), 20);

    assert!(repo
        .find_by_username_and_age_greater_than("", 15)
        .unwrap()
        .is_empty());
}

#[test]
fn username_and_exact_age() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("AAA", 10), ("AAA", 20), ("BBB", 10)]);

    let result = repo.find_by_username_and_age("AAA", 10).unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].age(), 10);
}

#[test]
fn single_result_lookup() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("AAA", 10), ("BBB", 20), ("BBB", 30)]);

    let found = repo.find_one_by_username("AAA").unwrap().unwrap();
    assert_eq!(found.age(), 10);
    assert!(repo.find_one_by_username("CCC").unwrap().is_none());

    let err = repo.find_one_by_username("BBB").unwrap_err();
    assert!(matches!(err, RepoError::NonUniqueResult { count: 2 }));
}

#[test]
fn username_set_membership() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("AAA", 10), ("BBB", 20), ("CCC", 30)]);

    let names = vec!["AAA".to_string(), "CCC".to_string(), "ZZZ".to_string()];
    let result = repo.find_by_usernames(&names).unwrap();
    assert_eq!(usernames(&result), vec!["AAA", "CCC"]);

    assert!(repo.find_by_usernames(&[]).unwrap().is_empty());
}

#[test]
fn username_projection_keeps_insert_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("CCC", 10), ("AAA", 20), ("BBB", 30)]);

    assert_eq!(repo.find_usernames().unwrap(), vec!["CCC", "AAA", "BBB"]);
}

#[test]
fn member_dtos_only_include_members_with_team() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    let teams = SqliteTeamRepository::try_new(&conn).unwrap();

    let mut team = Team::new("teamA");
    teams.save(&mut team).unwrap();
    let mut seeded = seed(&repo, &[("AAA", 10), ("BBB", 20)]);
    seeded[0].change_team(&mut team).unwrap();
    repo.save(&mut seeded[0]).unwrap();

    let dtos = repo.find_member_dtos().unwrap();
    assert_eq!(
        dtos,
        vec![MemberDto {
            id: seeded[0].id().unwrap(),
            username: "AAA".to_string(),
            team_name: Some("teamA".to_string()),
        }]
    );

    let json = serde_json::to_value(&dtos[0]).unwrap();
    assert_eq!(json["username"], "AAA");
    assert_eq!(json["team_name"], "teamA");
    assert!(json["id"].is_i64());
}

#[test]
fn filter_with_sort_and_age_ranges() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(
        &repo,
        &[("member1", 10), ("member2", 20), ("member3", 30), ("member4", 40)],
    );

    let at_least = repo
        .find_by_filter(
            &MemberFilter::new().age(AgeFilter::AtLeast(20)),
            Fetch::Lazy,
            Some(&Sort::desc(SortField::Age)),
        )
        .unwrap();
    assert_eq!(usernames(&at_least), vec!["member4", "member3", "member2"]);

    let younger = MemberFilter::new().age(AgeFilter::LessThan(30));
    assert_eq!(repo.count_by_filter(&younger).unwrap(), 2);
}

#[test]
fn page_of_five_with_size_three_sorted_by_username_desc() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(
        &repo,
        &[
            ("member1", 10),
            ("member2", 10),
            ("member3", 10),
            ("member4", 10),
            ("member5", 10),
            ("other", 11),
        ],
    );

    let request = PageRequest::of(0, 3)
        .unwrap()
        .with_sort(Sort::desc(SortField::Username));
    let page = repo.find_page_by_age(10, &request).unwrap();

    assert_eq!(
        usernames(page.content()),
        vec!["member5", "member4", "member3"]
    );
    assert_eq!(page.total_elements(), 5);
    assert_eq!(page.total_pages(), 2);
    assert_eq!(page.number(), 0);
    assert!(page.is_first());
    assert!(page.has_next());
    assert!(!page.has_previous());

    let next_request = PageRequest::of(1, 3)
        .unwrap()
        .with_sort(Sort::desc(SortField::Username));
    let second = repo.find_page_by_age(10, &next_request).unwrap();
    assert_eq!(usernames(second.content()), vec!["member2", "member1"]);
    assert!(second.is_last());
    assert!(second.has_previous());
}

#[test]
fn page_past_the_end_is_empty_but_counted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("member1", 10), ("member2", 10)]);

    let page = repo
        .find_page_by_age(10, &PageRequest::of(5, 2).unwrap())
        .unwrap();
    assert!(page.content().is_empty());
    assert_eq!(page.total_elements(), 2);
    assert_eq!(page.total_pages(), 1);
}

#[test]
fn slice_over_fetches_to_detect_next() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(
        &repo,
        &[
            ("member1", 10),
            ("member2", 10),
            ("member3", 10),
            ("member4", 10),
            ("member5", 10),
        ],
    );

    let request = PageRequest::of(0, 3)
        .unwrap()
        .with_sort(Sort::desc(SortField::Username));
    let slice = repo.find_slice_by_age(10, &request).unwrap();
    assert_eq!(
        usernames(slice.content()),
        vec!["member5", "member4", "member3"]
    );
    assert!(slice.has_next());

    let tail = repo
        .find_slice_by_age(10, &PageRequest::of(1, 3).unwrap())
        .unwrap();
    assert_eq!(tail.content().len(), 2);
    assert!(!tail.has_next());
}

#[test]
fn equal_sort_keys_fall_back_to_id_ascending() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    let seeded = seed(
        &repo,
        &[("B", 10), ("A", 10), ("B", 10), ("A", 10), ("B", 10)],
    );
    let ids: Vec<i64> = seeded.iter().map(|member| member.id().unwrap()).collect();

    let sorted = repo
        .find_by_filter(
            &MemberFilter::new(),
            Fetch::Lazy,
            Some(&Sort::desc(SortField::Username)),
        )
        .unwrap();
    let rows: Vec<(&str, i64)> = sorted
        .iter()
        .map(|member| (member.username(), member.id().unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("B", ids[0]),
            ("B", ids[2]),
            ("B", ids[4]),
            ("A", ids[1]),
            ("A", ids[3]),
        ]
    );

    let request = PageRequest::of(1, 2)
        .unwrap()
        .with_sort(Sort::desc(SortField::Username));
    let page = repo.find_page_by_age(10, &request).unwrap();
    let page_ids: Vec<i64> = page
        .content()
        .iter()
        .map(|member| member.id().unwrap())
        .collect();
    assert_eq!(page_ids, vec![ids[4], ids[1]]);
}

#[test]
fn bulk_increment_affects_threshold_and_above_and_leaves_read_entities_stale() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    let seeded = seed(
        &repo,
        &[
            ("member1", 10),
            ("member2", 19),
            ("member3", 20),
            ("member4", 21),
            ("member5", 40),
        ],
    );

    let before = repo.find_by_username("member5").unwrap().remove(0);
    assert_eq!(before.age(), 40);

    assert_eq!(repo.bulk_increment_age(20).unwrap(), 3);

    assert_eq!(before.age(), 40);
    let after = repo.find_by_username("member5").unwrap().remove(0);
    assert_eq!(after.age(), 41);

    let ages: Vec<i32> = repo.find_all().unwrap().iter().map(Member::age).collect();
    assert_eq!(ages, vec![10, 19, 21, 22, 41]);
    assert_eq!(seeded[2].age(), 20);
}

#[test]
fn bulk_increment_without_matches_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("member1", 10)]);

    assert_eq!(repo.bulk_increment_age(100).unwrap(), 0);
    assert_eq!(repo.find_all().unwrap()[0].age(), 10);
}

#[test]
fn every_read_is_answered_from_the_store() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::try_new(&conn).unwrap();
    seed(&repo, &[("member1", 10)]);

    raw_set_age(&conn, "member1", 33);
    assert_eq!(repo.find_by_username("member1").unwrap()[0].age(), 33);
}

fn raw_set_age(conn: &Connection, username: &str, age: i32) {
    conn.execute(
        "UPDATE members SET age = ?1 WHERE username = ?2;",
        rusqlite::params![age, username],
    )
    .unwrap();
}
