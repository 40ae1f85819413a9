use anyhow::Result;
use clap::Args;
use std::path::Path;

use crate::output::{OutputMode, render};
use crate::user::require_user;
use crate::validate::{parse_id, validate_body};
use warren_core::thread;

use super::{now_us, open_project};

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Post to comment on.
    pub post_id: String,

    /// Comment body.
    #[arg(long)]
    pub body: String,

    /// Reply to an existing comment on the same post.
    #[arg(long)]
    pub parent: Option<String>,
}

/// Execute `wrn comment`.
///
/// # Errors
///
/// Fails on validation errors, an unknown post or parent, a parent on a
/// different post, or a missing user identity.
pub fn run_comment(
    args: &CommentArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let post_id = parse_id(&args.post_id)?;
    let parent_id = args.parent.as_deref().map(parse_id).transpose()?;
    validate_body(&args.body)?;
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;
    let cache = project.thread_cache();

    let comment_id = thread::add_comment(
        &project.conn,
        &cache,
        post_id,
        parent_id,
        &user,
        &args.body,
        now_us(),
    )?;

    let result = serde_json::json!({
        "comment_id": comment_id,
        "post_id": post_id,
        "parent_comment_id": parent_id,
    });
    render(output, &result, |_, w| {
        match parent_id {
            Some(parent) => {
                writeln!(w, "✓ Replied to comment {parent} (comment {comment_id})")
            }
            None => writeln!(w, "✓ Commented on post {post_id} (comment {comment_id})"),
        }
    })
}
