use anyhow::Result;
use clap::Args;
use std::io::{self, Write};
use std::path::Path;

use crate::output::{OutputMode, render};
use crate::user::resolve_user;
use crate::validate::parse_id;
use warren_core::forest::CommentNode;
use warren_core::thread::load_thread;

use super::open_project;

#[derive(Args, Debug)]
pub struct ThreadArgs {
    /// Post id.
    pub post_id: String,
}

/// Execute `wrn thread`: the nested comment view of a post.
///
/// Works anonymously; with a resolved identity the viewer's own votes are
/// annotated on each comment.
///
/// # Errors
///
/// Fails on an invalid or unknown post id.
pub fn run_thread(
    args: &ThreadArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let post_id = parse_id(&args.post_id)?;
    let project = open_project(invoked_from)?;
    let cache = project.thread_cache();
    let viewer = resolve_user(user_flag);

    let view = load_thread(
        &project.conn,
        &cache,
        &project.config.thread,
        post_id,
        viewer.as_deref(),
    )?;

    render(output, &view, |v, w| {
        if v.comments.is_empty() {
            writeln!(w, "No comments yet.")
        } else {
            for node in &v.comments {
                write_node(w, node, 0)?;
            }
            Ok(())
        }
    })
}

fn write_node(w: &mut dyn Write, node: &CommentNode, depth: usize) -> io::Result<()> {
    let indent = "  ".repeat(depth);
    let own = match node.user_vote {
        Some(1) => ", you: +1",
        Some(-1) => ", you: -1",
        _ => "",
    };
    writeln!(
        w,
        "{indent}[{}] ({:+}{own}) {}: {}",
        node.comment_id, node.vote_count, node.author, node.body
    )?;
    for reply in &node.replies {
        write_node(w, reply, depth + 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::community;
    use crate::cmd::init::{InitArgs, run_init};
    use crate::cmd::{comment, post};

    fn project_with_thread() -> tempfile::TempDir {
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
        comment::run_comment(
            &comment::CommentArgs {
                post_id: "1".into(),
                body: "top".into(),
                parent: None,
            },
            Some("bob"),
            OutputMode::Text,
            dir.path(),
        )
        .expect("comment");
        dir
    }

    #[test]
    fn thread_renders_for_anonymous_viewer() {
        let dir = project_with_thread();
        run_thread(
            &ThreadArgs { post_id: "1".into() },
            Some(""),
            OutputMode::Json,
            dir.path(),
        )
        .expect("thread");
    }

    #[test]
    fn unknown_post_fails() {
        let dir = project_with_thread();
        assert!(
            run_thread(
                &ThreadArgs { post_id: "42".into() },
                Some("bob"),
                OutputMode::Text,
                dir.path(),
            )
            .is_err()
        );
    }

    #[test]
    fn text_tree_indents_replies() {
        use warren_core::forest::CommentNode;
        let node = CommentNode {
            comment_id: 1,
            parent_comment_id: None,
            author: "alice".into(),
            body: "top".into(),
            created_at_us: 100,
            vote_count: 2,
            user_vote: Some(1),
            replies: vec![CommentNode {
                comment_id: 2,
                parent_comment_id: Some(1),
                author: "bob".into(),
                body: "reply".into(),
                created_at_us: 200,
                vote_count: -1,
                user_vote: None,
                replies: Vec::new(),
            }],
        };

        let mut buf = Vec::new();
        write_node(&mut buf, &node, 0).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.contains("[1] (+2, you: +1) alice: top"));
        assert!(text.contains("  [2] (-1) bob: reply"));
    }
}
