use super::{
    delete_follow, delete_participants_for_schedule, find_follow, find_pending_request,
    get_follow_request, insert_follow, insert_follow_request, insert_participant,
    insert_schedule, insert_user, list_follow_requests, list_follows, list_participants,
    open_connection, set_follow_request_status, FollowDirection, FollowRecord,
    FollowRequestRecord, ParticipantFilter, ParticipantRecord, RequestDirection, ScheduleRecord,
    UserRecord, CURRENT_SCHEMA_VERSION,
};
use rusqlite::params;
use uuid::Uuid;

fn unique_db_path() -> String {
    std::env::temp_dir()
        .join(format!("huddle-db-{}.sqlite", Uuid::now_v7()))
        .display()
        .to_string()
}

fn cleanup_db_files(path: &str) {
    for suffix in ["", "-wal", "-shm"] {
        let candidate = format!("{path}{suffix}");
        let _ = std::fs::remove_file(candidate);
    }
}

fn table_exists(conn: &rusqlite::Connection, table_name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1)",
            params![table_name],
            |row| row.get(0),
        )
        .expect("table existence query should be readable");
    exists == 1
}

fn user(id: &str, email: &str) -> UserRecord {
    UserRecord {
        id: id.to_string(),
        name: format!("user {id}"),
        email: email.to_string(),
        password: "secret".to_string(),
        role: "User".to_string(),
        major: String::new(),
        student_id: String::new(),
        profile_picture: String::new(),
        is_active: true,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn request(id: &str, requester: &str, requestee: &str, status: &str) -> FollowRequestRecord {
    FollowRequestRecord {
        id: id.to_string(),
        requester_id: requester.to_string(),
        requestee_id: requestee.to_string(),
        status: status.to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn schedule(id: &str) -> ScheduleRecord {
    ScheduleRecord {
        id: id.to_string(),
        owner_id: "owner".to_string(),
        start_time: "2024-01-01T10:00:00".to_string(),
        end_time: "2024-01-01T11:00:00".to_string(),
        title: "Study group".to_string(),
        description: String::new(),
        location: "Library".to_string(),
        category: "study".to_string(),
        color: None,
        kind: None,
        status: None,
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn participant(id: &str, schedule_id: &str, user_id: &str, status: &str) -> ParticipantRecord {
    ParticipantRecord {
        id: id.to_string(),
        schedule_id: schedule_id.to_string(),
        user_id: user_id.to_string(),
        status: status.to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

#[test]
fn configures_connection_pragmas() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    let journal_mode: String = conn
        .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .expect("journal_mode pragma should be readable");
    assert_eq!(journal_mode.to_uppercase(), "WAL");

    let foreign_keys: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .expect("foreign_keys pragma should be readable");
    assert_eq!(foreign_keys, 1);

    let busy_timeout: i64 = conn
        .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
        .expect("busy_timeout pragma should be readable");
    assert_eq!(busy_timeout, 5000);

    cleanup_db_files(&path);
}

#[test]
fn initializes_required_tables_and_schema_version() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    let tables = [
        "schema_migrations",
        "meta",
        "users",
        "follows",
        "follow_requests",
        "schedules",
        "schedule_participants",
    ];
    for table in tables {
        assert!(
            table_exists(&conn, table),
            "expected table '{}' to exist",
            table
        );
    }

    let schema_version = super::get_meta(&conn, "schema_version")
        .expect("meta should be readable")
        .expect("schema version should be stored in meta table");
    assert_eq!(schema_version, CURRENT_SCHEMA_VERSION.to_string());

    cleanup_db_files(&path);
}

#[test]
fn reapplies_migrations_idempotently() {
    let path = unique_db_path();
    let conn_first = open_connection(&path).expect("first open should initialize schema");
    drop(conn_first);

    let conn_second = open_connection(&path).expect("second open should be idempotent");
    let applied_count: i64 = conn_second
        .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .expect("schema_migrations count should be queryable");
    assert_eq!(applied_count, CURRENT_SCHEMA_VERSION);

    cleanup_db_files(&path);
}

#[test]
fn user_email_is_unique() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    insert_user(&conn, &user("u1", "a@example.com")).expect("first insert should succeed");
    let duplicate = insert_user(&conn, &user("u2", "a@example.com"));
    assert!(duplicate.is_err());

    cleanup_db_files(&path);
}

#[test]
fn follow_edges_are_unique_per_ordered_pair() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");
    let edge = |id: &str, src: &str, dst: &str| FollowRecord {
        id: id.to_string(),
        follower_id: src.to_string(),
        followee_id: dst.to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    };

    insert_follow(&conn, &edge("f1", "a", "b")).expect("edge should insert");
    insert_follow(&conn, &edge("f2", "b", "a")).expect("reverse edge is a distinct pair");
    assert!(insert_follow(&conn, &edge("f3", "a", "b")).is_err());

    let followers = list_follows(&conn, "b", FollowDirection::Followers).expect("list");
    assert_eq!(followers.len(), 1);
    assert_eq!(followers[0].follower_id, "a");
    let following = list_follows(&conn, "b", FollowDirection::Following).expect("list");
    assert_eq!(following.len(), 1);
    assert_eq!(following[0].followee_id, "a");

    assert_eq!(delete_follow(&conn, "a", "b").expect("delete"), 1);
    assert!(find_follow(&conn, "a", "b").expect("find").is_none());
    assert_eq!(delete_follow(&conn, "a", "b").expect("delete again"), 0);

    cleanup_db_files(&path);
}

#[test]
fn request_status_update_is_guarded_by_expected_status() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    insert_follow_request(&conn, &request("r1", "a", "b", "Pending")).expect("insert");
    assert!(find_pending_request(&conn, "a", "b")
        .expect("lookup")
        .is_some());

    let changed = set_follow_request_status(&conn, "r1", "Pending", "Accepted", "now")
        .expect("update should run");
    assert_eq!(changed, 1);
    let stale = set_follow_request_status(&conn, "r1", "Pending", "Rejected", "now")
        .expect("update should run");
    assert_eq!(stale, 0);

    let stored = get_follow_request(&conn, "r1")
        .expect("lookup")
        .expect("request should exist");
    assert_eq!(stored.status, "Accepted");
    assert!(find_pending_request(&conn, "a", "b")
        .expect("lookup")
        .is_none());

    cleanup_db_files(&path);
}

#[test]
fn lists_requests_by_direction_and_status_in_insertion_order() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    insert_follow_request(&conn, &request("r1", "a", "c", "Pending")).expect("insert");
    insert_follow_request(&conn, &request("r2", "b", "c", "Rejected")).expect("insert");
    insert_follow_request(&conn, &request("r3", "d", "c", "Pending")).expect("insert");

    let incoming = list_follow_requests(&conn, "c", RequestDirection::Incoming, None)
        .expect("incoming should list");
    assert_eq!(
        incoming.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["r1", "r2", "r3"]
    );

    let pending = list_follow_requests(&conn, "c", RequestDirection::Incoming, Some("Pending"))
        .expect("pending should list");
    assert_eq!(
        pending.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["r1", "r3"]
    );

    let outgoing = list_follow_requests(&conn, "a", RequestDirection::Outgoing, None)
        .expect("outgoing should list");
    assert_eq!(outgoing.len(), 1);

    cleanup_db_files(&path);
}

#[test]
fn participants_require_an_existing_schedule() {
    let path = unique_db_path();
    let conn = open_connection(&path).expect("connection should open");

    let orphan = insert_participant(&conn, &participant("p0", "missing", "u1", "Pending"));
    assert!(orphan.is_err());

    insert_schedule(&conn, &schedule("s1")).expect("schedule should insert");
    insert_participant(&conn, &participant("p1", "s1", "u1", "Pending")).expect("insert");
    insert_participant(&conn, &participant("p2", "s1", "u2", "Accepted")).expect("insert");

    let accepted = list_participants(&conn, ParticipantFilter::ScheduleWithStatus("s1", "Accepted"))
        .expect("accepted should list");
    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].user_id, "u2");

    let for_user = list_participants(&conn, ParticipantFilter::User("u1")).expect("list");
    assert_eq!(for_user.len(), 1);

    assert_eq!(
        delete_participants_for_schedule(&conn, "s1").expect("delete"),
        2
    );
    assert!(list_participants(&conn, ParticipantFilter::Schedule("s1"))
        .expect("list")
        .is_empty());

    cleanup_db_files(&path);
}
