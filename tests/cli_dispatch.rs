use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::Value;
use uuid::Uuid;

fn unique_workspace(prefix: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("{prefix}-{}", Uuid::now_v7()));
    std::fs::create_dir_all(&path).expect("workspace should be creatable");
    path
}

fn run_huddle(db_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_huddle"))
        .env_remove("HUDDLE_CONFIG")
        .arg("--db")
        .arg(db_path)
        .args(args)
        .output()
        .expect("huddle command should run")
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "expected success but failed.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn assert_failure(output: &Output) {
    assert!(
        !output.status.success(),
        "expected failure but command succeeded.\nstdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

fn json_of(output: &Output) -> Value {
    assert_success(output);
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn register(db: &Path, name: &str) -> String {
    let email = format!("{}@campus.test", name.to_ascii_lowercase());
    let output = run_huddle(
        db,
        &[
            "user",
            "register",
            "--name",
            name,
            "--email",
            &email,
            "--password",
            "pw",
            "--json",
        ],
    );
    json_of(&output)["id"]
        .as_str()
        .expect("registered user should have an id")
        .to_string()
}

#[test]
fn follow_request_flow_through_the_binary() {
    let root = unique_workspace("huddle-cli-follow");
    let db = root.join("state/huddle.sqlite");
    let alice = register(&db, "Alice");
    let bob = register(&db, "Bob");

    let sent = json_of(&run_huddle(
        &db,
        &["request", "send", &alice, &bob, "--json"],
    ));
    let request_id = sent[0]["id"].as_str().expect("request id").to_string();
    assert_eq!(sent[0]["status"], "Pending");

    let pending = json_of(&run_huddle(&db, &["request", "pending", &bob, "--json"]));
    assert_eq!(pending.as_array().map(Vec::len), Some(1));

    let edge = json_of(&run_huddle(
        &db,
        &["request", "accept", &request_id, "--json"],
    ));
    assert_eq!(edge[0]["follower_id"], alice.as_str());

    let again = run_huddle(&db, &["request", "accept", &request_id]);
    assert_failure(&again);
    assert!(String::from_utf8_lossy(&again.stderr).contains("invalid status transition"));

    let summary = json_of(&run_huddle(&db, &["user", "summary", &bob, "--json"]));
    assert_eq!(summary["followers"][0]["id"], alice.as_str());
    assert!(summary["user"].get("password").is_none());

    let bad_id = run_huddle(&db, &["user", "show", "not-an-id"]);
    assert_failure(&bad_id);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn recurring_schedule_and_invitations_through_the_binary() {
    let root = unique_workspace("huddle-cli-schedule");
    let db = root.join("huddle.sqlite");
    let owner = register(&db, "Owner");
    let ana = register(&db, "Ana");

    let created = json_of(&run_huddle(
        &db,
        &[
            "schedule",
            "create",
            "--owner",
            &owner,
            "--start",
            "2024-01-01T10:00:00",
            "--end",
            "2024-01-01T11:00:00",
            "--title",
            "Study group",
            "--until",
            "2024-01-15",
            "--participant",
            &ana,
            "--json",
        ],
    ));
    let schedules = created["schedules"].as_array().expect("schedules array");
    assert_eq!(schedules.len(), 3);
    assert_eq!(schedules[1]["start_time"], "2024-01-08T10:00:00");
    let invitations = created["participants"].as_array().expect("participants");
    assert_eq!(invitations.len(), 3);
    let invite_id = invitations[0]["id"].as_str().expect("invite id").to_string();
    let schedule_id = schedules[0]["id"].as_str().expect("schedule id").to_string();

    let accepted = json_of(&run_huddle(
        &db,
        &["invite", "accept", &invite_id, "--json"],
    ));
    assert_eq!(accepted[0]["status"], "Accepted");

    let going = json_of(&run_huddle(
        &db,
        &["invite", "accepted", &schedule_id, "--json"],
    ));
    assert_eq!(going[0]["user"]["id"], ana.as_str());

    let mine = json_of(&run_huddle(&db, &["invite", "for-user", &ana, "--json"]));
    assert_eq!(mine.as_array().map(Vec::len), Some(3));

    let inverted = run_huddle(
        &db,
        &[
            "schedule",
            "create",
            "--owner",
            &owner,
            "--start",
            "2024-01-01T10:00:00",
            "--end",
            "2024-01-01T09:00:00",
            "--title",
            "Backwards",
        ],
    );
    assert_failure(&inverted);

    let listed = json_of(&run_huddle(&db, &["schedule", "list", &owner, "--json"]));
    assert_eq!(listed.as_array().map(Vec::len), Some(3));

    let deleted = json_of(&run_huddle(
        &db,
        &["schedule", "delete", &schedule_id, "--json"],
    ));
    assert_eq!(deleted["invitations_removed"], 1);

    let _ = std::fs::remove_dir_all(root);
}
