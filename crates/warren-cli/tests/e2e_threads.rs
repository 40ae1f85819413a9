//! End-to-end lifecycle tests driving the `wrn` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn wrn(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wrn").expect("binary builds");
    cmd.current_dir(dir);
    cmd.env_remove("WARREN_USER");
    cmd
}

fn init_project(dir: &Path) {
    wrn(dir).arg("init").assert().success();
}

fn seed_community_and_post(dir: &Path) {
    wrn(dir)
        .args(["community", "create", "rustdev", "--user", "alice"])
        .assert()
        .success();
    wrn(dir)
        .args([
            "post", "create", "rustdev", "--title", "Hello warren", "--body", "First post",
            "--user", "alice",
        ])
        .assert()
        .success();
}

#[test]
fn init_creates_project_and_refuses_reinit() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());

    assert!(dir.path().join(".warren/warren.db").is_file());
    assert!(dir.path().join(".warren/config.toml").is_file());

    wrn(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn commands_without_init_report_not_initialized() {
    let dir = tempfile::tempdir().expect("tempdir");

    wrn(dir.path())
        .args(["post", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no warren project"));

    wrn(dir.path())
        .args(["post", "list", "--json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E1001"));
}

#[test]
fn full_thread_lifecycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());
    seed_community_and_post(dir.path());

    // Two top-level comments and a reply to the first.
    wrn(dir.path())
        .args(["comment", "1", "--body", "First comment", "--user", "bob"])
        .assert()
        .success();
    wrn(dir.path())
        .args(["comment", "1", "--body", "Second comment", "--user", "carol"])
        .assert()
        .success();
    wrn(dir.path())
        .args([
            "comment", "1", "--parent", "1", "--body", "A reply", "--user", "dave",
        ])
        .assert()
        .success();

    // Votes: comment 1 gets +2, comment 2 gets -1.
    for voter in ["alice", "carol"] {
        wrn(dir.path())
            .args(["vote", "comment", "1", "up", "--user", voter])
            .assert()
            .success();
    }
    wrn(dir.path())
        .args(["vote", "comment", "2", "down", "--user", "bob"])
        .assert()
        .success();

    let assert = wrn(dir.path())
        .args(["thread", "1", "--json", "--user", "alice"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let view: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");

    let comments = view["comments"].as_array().expect("comments array");
    assert_eq!(comments.len(), 2);

    // Top-level order is newest first.
    assert_eq!(comments[0]["comment_id"], 2);
    assert_eq!(comments[0]["vote_count"], -1);
    assert_eq!(comments[0]["user_vote"], serde_json::Value::Null);

    assert_eq!(comments[1]["comment_id"], 1);
    assert_eq!(comments[1]["vote_count"], 2);
    assert_eq!(comments[1]["user_vote"], 1);

    let replies = comments[1]["replies"].as_array().expect("replies array");
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["comment_id"], 3);
    assert_eq!(replies[0]["parent_comment_id"], 1);
}

#[test]
fn reply_to_parent_on_other_post_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());
    seed_community_and_post(dir.path());

    wrn(dir.path())
        .args([
            "post", "create", "rustdev", "--title", "Another", "--body", "Second post",
            "--user", "alice",
        ])
        .assert()
        .success();
    wrn(dir.path())
        .args(["comment", "1", "--body", "On post one", "--user", "bob"])
        .assert()
        .success();

    wrn(dir.path())
        .args([
            "comment", "2", "--parent", "1", "--body", "Cross-post reply", "--user", "bob",
            "--json",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E2006"));
}

#[test]
fn revote_overwrites_and_unvote_clears() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());
    seed_community_and_post(dir.path());

    wrn(dir.path())
        .args(["vote", "post", "1", "up", "--user", "bob"])
        .assert()
        .success();
    wrn(dir.path())
        .args(["vote", "post", "1", "down", "--user", "bob"])
        .assert()
        .success();

    let assert = wrn(dir.path())
        .args(["post", "show", "1", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let post: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(post["vote_count"], -1);

    wrn(dir.path())
        .args(["unvote", "post", "1", "--user", "bob"])
        .assert()
        .success();

    let assert = wrn(dir.path())
        .args(["post", "show", "1", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let post: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(post["vote_count"], 0);
}

#[test]
fn mutations_require_identity() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());
    seed_community_and_post(dir.path());

    wrn(dir.path())
        .args(["comment", "1", "--body", "anonymous?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WARREN_USER"));

    // WARREN_USER env works in place of the flag.
    wrn(dir.path())
        .args(["comment", "1", "--body", "identified"])
        .env("WARREN_USER", "bob")
        .assert()
        .success();
}

#[test]
fn poll_lifecycle() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());
    wrn(dir.path())
        .args(["community", "create", "rustdev", "--user", "alice"])
        .assert()
        .success();
    wrn(dir.path())
        .args([
            "post", "create", "rustdev", "--title", "Pick one", "--option", "Yes", "--option",
            "No", "--user", "alice",
        ])
        .assert()
        .success();

    let assert = wrn(dir.path())
        .args(["poll", "results", "1", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let results: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let first_option = results["options"][0]["option_id"]
        .as_i64()
        .expect("option id");

    wrn(dir.path())
        .args([
            "poll", "ballot", "1", &first_option.to_string(), "--user", "bob",
        ])
        .assert()
        .success();

    let assert = wrn(dir.path())
        .args(["poll", "results", "1", "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let results: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(results["total_ballots"], 1);
    assert_eq!(results["options"][0]["ballots"], 1);
}

#[test]
fn saved_posts_listing() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());
    seed_community_and_post(dir.path());

    wrn(dir.path())
        .args(["post", "save", "1", "--user", "bob"])
        .assert()
        .success();

    wrn(dir.path())
        .args(["post", "saved", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hello warren"));

    wrn(dir.path())
        .args(["post", "unsave", "1", "--user", "bob"])
        .assert()
        .success();

    wrn(dir.path())
        .args(["post", "saved", "--user", "bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved posts"));
}

#[test]
fn summary_without_endpoint_degrades_gracefully() {
    let dir = tempfile::tempdir().expect("tempdir");
    init_project(dir.path());
    seed_community_and_post(dir.path());

    wrn(dir.path())
        .args(["summary", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No summary available"));
}
