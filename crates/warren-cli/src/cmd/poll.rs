use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, render};
use crate::user::require_user;
use crate::validate::parse_id;
use warren_core::db::{query, write};

use super::{now_us, open_project};

#[derive(Args, Debug)]
pub struct BallotArgs {
    /// Poll post id.
    pub post_id: String,

    /// Option id to vote for (see `wrn poll results`).
    pub option_id: String,
}

#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Poll post id.
    pub post_id: String,
}

#[derive(Debug, Serialize)]
struct PollResults {
    post_id: i64,
    total_ballots: i64,
    options: Vec<PollOptionOut>,
}

#[derive(Debug, Serialize)]
struct PollOptionOut {
    option_id: i64,
    label: String,
    ballots: i64,
}

/// Execute `wrn poll ballot`: cast (or change) the user's ballot.
///
/// # Errors
///
/// Fails when the post is not a poll, the option belongs to another post,
/// or the user identity is missing.
pub fn run_ballot(
    args: &BallotArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let post_id = parse_id(&args.post_id)?;
    let option_id = parse_id(&args.option_id)?;
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    write::cast_poll_ballot(&project.conn, &user, post_id, option_id, now_us())?;

    let result = serde_json::json!({ "post_id": post_id, "option_id": option_id });
    render(output, &result, |_, w| {
        writeln!(w, "✓ Ballot cast for option {option_id} on poll {post_id}")
    })
}

/// Execute `wrn poll results`: option labels with ballot counts.
///
/// # Errors
///
/// Fails on an unknown or non-poll post.
pub fn run_results(args: &ResultsArgs, output: OutputMode, invoked_from: &Path) -> Result<()> {
    let post_id = parse_id(&args.post_id)?;
    let project = open_project(invoked_from)?;

    let post = query::get_post(&project.conn, post_id)?
        .ok_or(write::WriteError::PostNotFound(post_id))?;
    if post.kind != "poll" {
        return Err(write::WriteError::NotAPoll(post_id).into());
    }

    let options = query::poll_options(&project.conn, post_id)?;
    let results = PollResults {
        post_id,
        total_ballots: options.iter().map(|o| o.ballots).sum(),
        options: options
            .into_iter()
            .map(|o| PollOptionOut {
                option_id: o.option_id,
                label: o.label,
                ballots: o.ballots,
            })
            .collect(),
    };

    render(output, &results, |r, w| {
        writeln!(w, "Poll {} — {} ballots", r.post_id, r.total_ballots)?;
        for option in &r.options {
            writeln!(w, "  [{}] {} — {}", option.option_id, option.label, option.ballots)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::community;
    use crate::cmd::init::{InitArgs, run_init};
    use crate::cmd::post;

    fn project_with_poll() -> tempfile::TempDir {
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
                title: "Pick one".into(),
                body: None,
                url: None,
                option: vec!["Yes".into(), "No".into()],
            },
            Some("alice"),
            OutputMode::Text,
            dir.path(),
        )
        .expect("poll");
        dir
    }

    #[test]
    fn ballot_then_results() {
        let dir = project_with_poll();
        let project = open_project(dir.path()).expect("open");
        let options = query::poll_options(&project.conn, 1).expect("options");
        drop(project);

        let args = BallotArgs {
            post_id: "1".into(),
            option_id: options[0].option_id.to_string(),
        };
        run_ballot(&args, Some("bob"), OutputMode::Text, dir.path()).expect("ballot");

        let project = open_project(dir.path()).expect("open");
        let counts = query::poll_ballot_counts(&project.conn, 1).expect("counts");
        assert_eq!(counts.get(&options[0].option_id), Some(&1));
        drop(project);

        run_results(
            &ResultsArgs { post_id: "1".into() },
            OutputMode::Json,
            dir.path(),
        )
        .expect("results");
    }

    #[test]
    fn results_on_text_post_fails() {
        let dir = project_with_poll();
        post::run_create(
            &post::CreateArgs {
                community: "rustdev".into(),
                title: "Just text".into(),
                body: Some("hello".into()),
                url: None,
                option: Vec::new(),
            },
            Some("alice"),
            OutputMode::Text,
            dir.path(),
        )
        .expect("text post");

        assert!(
            run_results(&ResultsArgs { post_id: "2".into() }, OutputMode::Text, dir.path())
                .is_err()
        );
    }
}
