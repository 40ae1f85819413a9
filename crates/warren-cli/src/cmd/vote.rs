use anyhow::Result;
use clap::Args;
use std::path::Path;
use std::str::FromStr;

use crate::output::{OutputMode, render};
use crate::user::require_user;
use crate::validate::parse_id;
use warren_core::model::{TargetType, VoteValue};
use warren_core::thread;

use super::{now_us, open_project};

#[derive(Args, Debug)]
pub struct VoteArgs {
    /// Vote target: `post` or `comment`.
    pub target: String,

    /// Target id.
    pub id: String,

    /// Direction: `up`, `down`, `+1`, or `-1`.
    pub direction: String,
}

#[derive(Args, Debug)]
pub struct UnvoteArgs {
    /// Vote target: `post` or `comment`.
    pub target: String,

    /// Target id.
    pub id: String,
}

/// Execute `wrn vote`. Re-voting on the same target overwrites the
/// previous direction.
///
/// # Errors
///
/// Fails on invalid target/direction values, an unknown target, or a
/// missing user identity.
pub fn run_vote(
    args: &VoteArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let target_type = TargetType::from_str(&args.target)?;
    let target_id = parse_id(&args.id)?;
    let value = VoteValue::from_str(&args.direction)?;
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;
    let cache = project.thread_cache();

    thread::cast_vote(
        &project.conn,
        &cache,
        &user,
        target_type,
        target_id,
        value,
        now_us(),
    )?;

    let result = serde_json::json!({
        "target_type": target_type,
        "target_id": target_id,
        "value": value,
    });
    render(output, &result, |_, w| {
        writeln!(w, "✓ Voted {value} on {target_type} {target_id}")
    })
}

/// Execute `wrn unvote`: remove the user's vote from a target.
///
/// # Errors
///
/// Fails on invalid values, an unknown target, or a missing user identity.
pub fn run_unvote(
    args: &UnvoteArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let target_type = TargetType::from_str(&args.target)?;
    let target_id = parse_id(&args.id)?;
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;
    let cache = project.thread_cache();

    let removed = thread::clear_vote(&project.conn, &cache, &user, target_type, target_id)?;

    let result = serde_json::json!({
        "target_type": target_type,
        "target_id": target_id,
        "removed": removed,
    });
    render(output, &result, |_, w| {
        if removed {
            writeln!(w, "✓ Removed vote from {target_type} {target_id}")
        } else {
            writeln!(w, "No vote to remove on {target_type} {target_id}")
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::community;
    use crate::cmd::init::{InitArgs, run_init};
    use crate::cmd::{open_project, post};
    use warren_core::db::votes;

    fn project_with_post() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, dir.path()).expect("init");
        community::run_create(
            &community::CreateArgs {
                name: "rustdev".into(),
                description: None,
            },
            Some("alice"),
            OutputMode::Text,
            dir.path(),
        )
        .expect("community");
        post::run_create(
            &post::CreateArgs {
                community: "rustdev".into(),
                title: "A title".into(),
                body: Some("hello".into()),
                url: None,
                option: Vec::new(),
            },
            Some("alice"),
            OutputMode::Text,
            dir.path(),
        )
        .expect("post");
        dir
    }

    fn vote_args(target: &str, id: &str, direction: &str) -> VoteArgs {
        VoteArgs {
            target: target.into(),
            id: id.into(),
            direction: direction.into(),
        }
    }

    #[test]
    fn vote_then_revote_overwrites() {
        let dir = project_with_post();
        run_vote(&vote_args("post", "1", "up"), Some("bob"), OutputMode::Text, dir.path())
            .expect("vote");
        run_vote(&vote_args("post", "1", "down"), Some("bob"), OutputMode::Text, dir.path())
            .expect("revote");

        let project = open_project(dir.path()).expect("open");
        let scores = votes::aggregate_votes(&project.conn, TargetType::Post, &[1]).expect("agg");
        assert_eq!(scores.get(&1), Some(&-1));
    }

    #[test]
    fn unvote_removes() {
        let dir = project_with_post();
        run_vote(&vote_args("post", "1", "+1"), Some("bob"), OutputMode::Text, dir.path())
            .expect("vote");
        run_unvote(
            &UnvoteArgs {
                target: "post".into(),
                id: "1".into(),
            },
            Some("bob"),
            OutputMode::Text,
            dir.path(),
        )
        .expect("unvote");

        let project = open_project(dir.path()).expect("open");
        let scores = votes::aggregate_votes(&project.conn, TargetType::Post, &[1]).expect("agg");
        assert!(scores.is_empty());
    }

    #[test]
    fn invalid_direction_fails() {
        let dir = project_with_post();
        assert!(
            run_vote(&vote_args("post", "1", "sideways"), Some("bob"), OutputMode::Text, dir.path())
                .is_err()
        );
    }

    #[test]
    fn vote_on_missing_comment_fails() {
        let dir = project_with_post();
        assert!(
            run_vote(&vote_args("comment", "7", "up"), Some("bob"), OutputMode::Text, dir.path())
                .is_err()
        );
    }
}
