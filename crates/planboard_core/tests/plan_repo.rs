use planboard_core::db::migrations::latest_version;
use planboard_core::db::open_db_in_memory;
use planboard_core::{
    Plan, PlanCriteria, PlanDraft, PlanListQuery, PlanRepository, RepoError,
    SqlitePlanRepository, SqliteUserRepository, User, UserId, UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn plan_at(owner: UserId, title: &str, created_at: i64) -> Plan {
    let mut plan = Plan::from_draft(&PlanDraft::new(owner, title, "details")).unwrap();
    plan.created_at = created_at;
    plan
}

fn plan_with_fixed_id(id: &str, owner: UserId, created_at: i64) -> Plan {
    let mut plan = Plan::with_id(
        Uuid::parse_str(id).unwrap(),
        &PlanDraft::new(owner, "same instant", "details"),
    )
    .unwrap();
    plan.created_at = created_at;
    plan
}

fn titles(plans: &[planboard_core::PlanSummary]) -> Vec<&str> {
    plans.iter().map(|plan| plan.title.as_str()).collect()
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqlitePlanRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_plans_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqlitePlanRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("plans"))
    ));
}

#[test]
fn repository_rejects_connection_missing_version_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE plans (
            uuid TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            user_uuid TEXT NOT NULL,
            start_at INTEGER,
            end_at INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqlitePlanRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "plans",
            column: "version"
        })
    ));
}

#[test]
fn insert_rejects_invalid_plan_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();

    let mut plan = plan_at(Uuid::new_v4(), "Trip", 1_000);
    plan.title = " ".to_string();
    let err = repo.insert_plan(&plan).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert!(repo.get_plan(plan.id).unwrap().is_none());
}

#[test]
fn insert_duplicate_id_is_a_store_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();

    let plan = plan_at(Uuid::new_v4(), "Trip", 1_000);
    repo.insert_plan(&plan).unwrap();
    let err = repo.insert_plan(&plan).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
}

#[test]
fn save_returns_next_version_and_rejects_stale_copies() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();

    let mut plan = plan_at(Uuid::new_v4(), "Trip", 1_000);
    repo.insert_plan(&plan).unwrap();
    let stale = plan.clone();

    plan.body = "updated".to_string();
    assert_eq!(repo.save_plan(&plan).unwrap(), 1);

    let err = repo.save_plan(&stale).unwrap_err();
    assert!(matches!(
        err,
        RepoError::VersionConflict {
            expected_version: 0,
            ..
        }
    ));
    assert_eq!(repo.get_plan(plan.id).unwrap().unwrap().body, "updated");
}

#[test]
fn save_with_exhausted_version_counter_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();

    let mut plan = plan_at(Uuid::new_v4(), "Trip", 1_000);
    plan.version = u32::MAX;
    repo.insert_plan(&plan).unwrap();

    plan.body = "updated".to_string();
    let err = repo.save_plan(&plan).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("version")));

    let stored = repo.get_plan(plan.id).unwrap().unwrap();
    assert_eq!(stored.body, "details");
    assert_eq!(stored.version, u32::MAX);
}

#[test]
fn list_breaks_created_at_ties_by_id() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();

    let plan_c = plan_with_fixed_id("00000000-0000-4000-8000-000000000003", owner, 7_000);
    let plan_a = plan_with_fixed_id("00000000-0000-4000-8000-000000000001", owner, 7_000);
    let plan_b = plan_with_fixed_id("00000000-0000-4000-8000-000000000002", owner, 7_000);
    repo.insert_plan(&plan_c).unwrap();
    repo.insert_plan(&plan_a).unwrap();
    repo.insert_plan(&plan_b).unwrap();

    let page = repo.list_plans(&PlanListQuery::page(2, 0)).unwrap();
    let ids: Vec<_> = page.iter().map(|plan| plan.id).collect();
    assert_eq!(ids, vec![plan_a.id, plan_b.id]);

    let next = repo.list_plans(&PlanListQuery::page(2, 1)).unwrap();
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].id, plan_c.id);
}

#[test]
fn list_page_size_defaults_to_30_and_caps_at_100() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    for idx in 0..120 {
        repo.insert_plan(&plan_at(owner, &format!("plan {idx}"), idx))
            .unwrap();
    }

    let defaulted = repo.list_plans(&PlanListQuery::default()).unwrap();
    assert_eq!(defaulted.len(), 30);
    assert_eq!(defaulted[0].title, "plan 119");

    let capped = repo.list_plans(&PlanListQuery::page(500, 0)).unwrap();
    assert_eq!(capped.len(), 100);

    let far = repo.list_plans(&PlanListQuery::page(100, u32::MAX)).unwrap();
    assert!(far.is_empty());
}

#[test]
fn oversized_page_size_skips_full_requested_pages() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();
    for idx in 0..160 {
        repo.insert_plan(&plan_at(owner, &format!("plan {idx}"), idx))
            .unwrap();
    }

    let first = repo.list_plans(&PlanListQuery::page(150, 0)).unwrap();
    assert_eq!(first.len(), 100);
    assert_eq!(first[0].title, "plan 159");

    let second = repo.list_plans(&PlanListQuery::page(150, 1)).unwrap();
    assert_eq!(second.len(), 10);
    assert_eq!(second[0].title, "plan 9");
    assert_eq!(second[9].title, "plan 0");
}

#[test]
fn list_filters_by_owner_and_title() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let ada = users.create_user(&User::new("Ada", "ada@example.com")).unwrap();
    let grace = users
        .create_user(&User::new("Grace", "grace@example.com"))
        .unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();
    repo.insert_plan(&plan_at(ada, "Summer Trip", 1_000)).unwrap();
    repo.insert_plan(&plan_at(ada, "Budget", 2_000)).unwrap();
    repo.insert_plan(&plan_at(grace, "Winter trip", 3_000))
        .unwrap();

    let by_owner = PlanListQuery::default().with_criteria(PlanCriteria {
        user: Some(ada),
        ..PlanCriteria::default()
    });
    assert_eq!(
        titles(&repo.list_plans(&by_owner).unwrap()),
        vec!["Budget", "Summer Trip"]
    );

    let by_title = PlanListQuery::default().with_criteria(PlanCriteria {
        title_contains: Some(" TRIP ".to_string()),
        ..PlanCriteria::default()
    });
    assert_eq!(
        titles(&repo.list_plans(&by_title).unwrap()),
        vec!["Winter trip", "Summer Trip"]
    );

    let combined = PlanListQuery::default().with_criteria(PlanCriteria {
        user: Some(grace),
        title_contains: Some("summer".to_string()),
        ..PlanCriteria::default()
    });
    assert!(repo.list_plans(&combined).unwrap().is_empty());

    let blank_title = PlanListQuery::default().with_criteria(PlanCriteria {
        title_contains: Some("   ".to_string()),
        ..PlanCriteria::default()
    });
    assert_eq!(repo.list_plans(&blank_title).unwrap().len(), 3);
}

#[test]
fn list_filters_by_creation_window_and_active_instant() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();
    let owner = Uuid::new_v4();

    let mut open_ended = plan_at(owner, "open ended", 1_000);
    open_ended.start = Some(100);
    let mut closed = plan_at(owner, "closed", 2_000);
    closed.start = Some(100);
    closed.end = Some(200);
    let undated = plan_at(owner, "undated", 3_000);
    for plan in [&open_ended, &closed, &undated] {
        repo.insert_plan(plan).unwrap();
    }

    let window = PlanListQuery::default().with_criteria(PlanCriteria {
        created_from: Some(1_000),
        created_until: Some(3_000),
        ..PlanCriteria::default()
    });
    assert_eq!(
        titles(&repo.list_plans(&window).unwrap()),
        vec!["closed", "open ended"]
    );

    let active_late = PlanListQuery::default().with_criteria(PlanCriteria {
        active_at: Some(500),
        ..PlanCriteria::default()
    });
    assert_eq!(
        titles(&repo.list_plans(&active_late).unwrap()),
        vec!["undated", "open ended"]
    );

    let active_early = PlanListQuery::default().with_criteria(PlanCriteria {
        active_at: Some(50),
        ..PlanCriteria::default()
    });
    assert_eq!(
        titles(&repo.list_plans(&active_early).unwrap()),
        vec!["undated"]
    );
}

#[test]
fn find_detail_with_dangling_owner_resolves_to_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();

    let plan = plan_at(Uuid::new_v4(), "Trip", 1_000);
    repo.insert_plan(&plan).unwrap();
    let detail = repo.find_plan_detail(plan.id).unwrap().unwrap();
    assert!(detail.user.is_none());
    assert!(repo.find_plan_detail(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn get_plan_rejects_corrupted_owner_reference() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqlitePlanRepository::try_new(&conn).unwrap();

    let plan = plan_at(Uuid::new_v4(), "Trip", 1_000);
    repo.insert_plan(&plan).unwrap();
    conn.execute("UPDATE plans SET user_uuid = 'not-a-uuid';", [])
        .unwrap();

    let err = repo.get_plan(plan.id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("plans.user_uuid")));
}

#[test]
fn users_repository_validates_and_round_trips() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();

    let err = users.create_user(&User::new("", "x@example.com")).unwrap_err();
    assert!(matches!(err, RepoError::UserValidation(_)));

    let user = User::new("Ada", "ada@example.com").with_username("ada");
    let id = users.create_user(&user).unwrap();
    assert_eq!(users.get_user(id).unwrap(), Some(user));

    users.delete_user(id).unwrap();
    assert!(users.get_user(id).unwrap().is_none());
    assert!(matches!(
        users.delete_user(id),
        Err(RepoError::NotFound(missing)) if missing == id
    ));
}
