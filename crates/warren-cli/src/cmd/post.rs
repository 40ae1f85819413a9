use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, render};
use crate::user::require_user;
use crate::validate::{parse_id, validate_body, validate_title};
use warren_core::db::{query, votes, write};
use warren_core::model::TargetType;

use super::{now_us, open_project};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Community to post in.
    pub community: String,

    /// Post title.
    #[arg(long)]
    pub title: String,

    /// Body text (text post). Mutually exclusive with --url and --option.
    #[arg(long, conflicts_with_all = ["url", "option"])]
    pub body: Option<String>,

    /// Link URL (link post). Mutually exclusive with --body and --option.
    #[arg(long, conflicts_with_all = ["body", "option"])]
    pub url: Option<String>,

    /// Poll option (poll post, repeat at least twice).
    #[arg(long = "option")]
    pub option: Vec<String>,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Restrict to one community.
    #[arg(long)]
    pub community: Option<String>,

    /// Maximum number of posts to show.
    #[arg(long, default_value_t = 25)]
    pub limit: u32,

    /// Number of posts to skip.
    #[arg(long, default_value_t = 0)]
    pub offset: u32,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Post id.
    pub id: String,
}

#[derive(Args, Debug)]
pub struct SaveArgs {
    /// Post id.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct PostOut {
    post_id: i64,
    community_id: i64,
    author: String,
    title: String,
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    vote_count: i64,
    created_at_us: i64,
}

impl PostOut {
    fn new(post: query::QueryPost, vote_count: i64) -> Self {
        Self {
            post_id: post.post_id,
            community_id: post.community_id,
            author: post.author,
            title: post.title,
            kind: post.kind,
            body: post.body,
            url: post.url,
            vote_count,
            created_at_us: post.created_at_us,
        }
    }
}

fn content_from_args(args: &CreateArgs) -> Result<write::PostContent> {
    if let Some(body) = &args.body {
        validate_body(body)?;
        return Ok(write::PostContent::Text { body: body.clone() });
    }
    if let Some(url) = &args.url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("link posts need an http(s) URL, got '{url}'");
        }
        return Ok(write::PostContent::Link { url: url.clone() });
    }
    if !args.option.is_empty() {
        return Ok(write::PostContent::Poll {
            options: args.option.clone(),
        });
    }
    anyhow::bail!("provide one of --body, --url, or at least two --option flags")
}

/// Execute `wrn post create`.
///
/// # Errors
///
/// Fails on validation errors, an unknown community, or a missing user.
pub fn run_create(
    args: &CreateArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    validate_title(&args.title)?;
    let content = content_from_args(args)?;
    let user = require_user(user_flag)?;
    let mut project = open_project(invoked_from)?;

    let post_id = write::create_post(
        &mut project.conn,
        &args.community,
        &user,
        args.title.trim(),
        &content,
        now_us(),
    )?;

    let post = query::get_post(&project.conn, post_id)?
        .ok_or_else(|| anyhow::anyhow!("post {post_id} vanished after create"))?;
    let out = PostOut::new(post, 0);

    render(output, &out, |p, w| {
        writeln!(w, "✓ Created {} post {} in '{}'", p.kind, p.post_id, args.community)
    })
}

/// Execute `wrn post list`.
///
/// # Errors
///
/// Fails on an unknown community filter.
pub fn run_list(args: &ListArgs, output: OutputMode, invoked_from: &Path) -> Result<()> {
    let project = open_project(invoked_from)?;

    let community_id = match &args.community {
        Some(name) => Some(
            query::get_community_by_name(&project.conn, name)?
                .ok_or(write::WriteError::CommunityNotFound(name.clone()))?
                .community_id,
        ),
        None => None,
    };

    let posts = query::list_posts(&project.conn, community_id, args.limit, args.offset)?;
    let post_ids: Vec<i64> = posts.iter().map(|p| p.post_id).collect();
    let scores = votes::aggregate_votes(&project.conn, TargetType::Post, &post_ids)?;

    let out: Vec<PostOut> = posts
        .into_iter()
        .map(|p| {
            let score = scores.get(&p.post_id).copied().unwrap_or(0);
            PostOut::new(p, score)
        })
        .collect();

    render(output, &out, |list, w| {
        if list.is_empty() {
            writeln!(w, "No posts.")
        } else {
            for p in list {
                writeln!(
                    w,
                    "{:>5}  {:>4}  [{}] {}  — {}",
                    p.post_id, p.vote_count, p.kind, p.title, p.author
                )?;
            }
            Ok(())
        }
    })
}

/// Execute `wrn post show`.
///
/// # Errors
///
/// Fails on an invalid or unknown post id.
pub fn run_show(args: &ShowArgs, output: OutputMode, invoked_from: &Path) -> Result<()> {
    let post_id = parse_id(&args.id)?;
    let project = open_project(invoked_from)?;

    let post = query::get_post(&project.conn, post_id)?
        .ok_or(write::WriteError::PostNotFound(post_id))?;
    let scores = votes::aggregate_votes(&project.conn, TargetType::Post, &[post_id])?;
    let comment_count = query::comment_count(&project.conn, post_id)?;
    let summary = post.ai_summary.clone();
    let is_poll = post.kind == "poll";
    let out = PostOut::new(post, scores.get(&post_id).copied().unwrap_or(0));

    let poll_options = if is_poll {
        query::poll_options(&project.conn, post_id)?
    } else {
        Vec::new()
    };

    #[derive(Serialize)]
    struct ShowOut {
        #[serde(flatten)]
        post: PostOut,
        comment_count: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        poll_options: Vec<PollOptionOut>,
    }

    #[derive(Serialize)]
    struct PollOptionOut {
        option_id: i64,
        label: String,
        ballots: i64,
    }

    let view = ShowOut {
        post: out,
        comment_count,
        summary,
        poll_options: poll_options
            .into_iter()
            .map(|o| PollOptionOut {
                option_id: o.option_id,
                label: o.label,
                ballots: o.ballots,
            })
            .collect(),
    };

    render(output, &view, |v, w| {
        writeln!(w, "#{} {} ({})", v.post.post_id, v.post.title, v.post.kind)?;
        writeln!(w, "by {} | score {} | {} comments", v.post.author, v.post.vote_count, v.comment_count)?;
        if let Some(body) = &v.post.body {
            writeln!(w)?;
            writeln!(w, "{body}")?;
        }
        if let Some(url) = &v.post.url {
            writeln!(w, "{url}")?;
        }
        for option in &v.poll_options {
            writeln!(w, "  [{}] {} — {} ballots", option.option_id, option.label, option.ballots)?;
        }
        if let Some(summary) = &v.summary {
            writeln!(w)?;
            writeln!(w, "summary: {summary}")?;
        }
        Ok(())
    })
}

/// Execute `wrn post save`.
///
/// # Errors
///
/// Fails on an unknown post or missing user identity.
pub fn run_save(
    args: &SaveArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let post_id = parse_id(&args.id)?;
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    write::save_post(&project.conn, &user, post_id, now_us())?;

    let result = serde_json::json!({ "post_id": post_id, "saved": true });
    render(output, &result, |_, w| writeln!(w, "✓ Saved post {post_id}"))
}

/// Execute `wrn post unsave`.
///
/// # Errors
///
/// Fails on an invalid id or missing user identity.
pub fn run_unsave(
    args: &SaveArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let post_id = parse_id(&args.id)?;
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    let removed = write::unsave_post(&project.conn, &user, post_id)?;

    let result = serde_json::json!({ "post_id": post_id, "saved": false });
    render(output, &result, |_, w| {
        if removed {
            writeln!(w, "✓ Unsaved post {post_id}")
        } else {
            writeln!(w, "Post {post_id} was not saved")
        }
    })
}

/// Execute `wrn post saved`: the user's saved posts.
///
/// # Errors
///
/// Fails on a missing user identity.
pub fn run_saved(user_flag: Option<&str>, output: OutputMode, invoked_from: &Path) -> Result<()> {
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    let posts = query::saved_posts(&project.conn, &user)?;
    let post_ids: Vec<i64> = posts.iter().map(|p| p.post_id).collect();
    let scores = votes::aggregate_votes(&project.conn, TargetType::Post, &post_ids)?;

    let out: Vec<PostOut> = posts
        .into_iter()
        .map(|p| {
            let score = scores.get(&p.post_id).copied().unwrap_or(0);
            PostOut::new(p, score)
        })
        .collect();

    render(output, &out, |list, w| {
        if list.is_empty() {
            writeln!(w, "No saved posts.")
        } else {
            for p in list {
                writeln!(w, "{:>5}  {:>4}  {}", p.post_id, p.vote_count, p.title)?;
            }
            Ok(())
        }
    })
}
