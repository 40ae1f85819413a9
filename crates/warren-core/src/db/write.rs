//! Write path for the warren store.
//!
//! Mutations validate referential rules up front (parent exists, parent is
//! on the same post, community name free) and return typed [`WriteError`]
//! variants the CLI maps to stable error codes. Votes and ballots are
//! upserts keyed on the caster, so repeating an action overwrites rather
//! than appends.

use crate::model::{PostKind, TargetType, VoteValue};
use rusqlite::{Connection, params};
use thiserror::Error;

use super::query;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("community '{0}' not found")]
    CommunityNotFound(String),
    #[error("community '{0}' already exists")]
    DuplicateCommunity(String),
    #[error("post {0} not found")]
    PostNotFound(i64),
    #[error("comment {0} not found")]
    CommentNotFound(i64),
    #[error("parent comment {0} not found")]
    ParentNotFound(i64),
    #[error("parent comment {parent_id} belongs to post {parent_post_id}, not post {post_id}")]
    CrossPostParent {
        parent_id: i64,
        parent_post_id: i64,
        post_id: i64,
    },
    #[error("post {0} is not a poll")]
    NotAPoll(i64),
    #[error("poll option {option_id} does not belong to post {post_id}")]
    OptionNotOnPost { option_id: i64, post_id: i64 },
    #[error("{kind} posts {requirement}")]
    KindMismatch {
        kind: PostKind,
        requirement: &'static str,
    },
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type WriteResult<T> = Result<T, WriteError>;

/// What a new post carries beyond its title; one variant per [`PostKind`].
#[derive(Debug, Clone)]
pub enum PostContent {
    Text { body: String },
    Link { url: String },
    Poll { options: Vec<String> },
}

impl PostContent {
    const fn kind(&self) -> PostKind {
        match self {
            Self::Text { .. } => PostKind::Text,
            Self::Link { .. } => PostKind::Link,
            Self::Poll { .. } => PostKind::Poll,
        }
    }
}

/// Create a community. The name must be unused.
///
/// # Errors
///
/// Returns [`WriteError::DuplicateCommunity`] when the name is taken.
pub fn create_community(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    created_by: &str,
    now_us: i64,
) -> WriteResult<i64> {
    if query::get_community_by_name(conn, name)?.is_some() {
        return Err(WriteError::DuplicateCommunity(name.to_owned()));
    }

    conn.execute(
        "INSERT INTO communities (name, description, created_by, created_at_us) \
         VALUES (?1, ?2, ?3, ?4)",
        params![name, description, created_by, now_us],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Create a post in a community, including poll options for poll posts.
///
/// # Errors
///
/// Returns [`WriteError::CommunityNotFound`] for an unknown community and
/// [`WriteError::KindMismatch`] when a poll has fewer than two options.
pub fn create_post(
    conn: &mut Connection,
    community_name: &str,
    author: &str,
    title: &str,
    content: &PostContent,
    now_us: i64,
) -> WriteResult<i64> {
    let community = query::get_community_by_name(conn, community_name)?
        .ok_or_else(|| WriteError::CommunityNotFound(community_name.to_owned()))?;

    if let PostContent::Poll { options } = content {
        if options.len() < 2 {
            return Err(WriteError::KindMismatch {
                kind: PostKind::Poll,
                requirement: "need at least two options",
            });
        }
    }

    let kind = content.kind();
    let (body, url) = match content {
        PostContent::Text { body } => (Some(body.as_str()), None),
        PostContent::Link { url } => (None, Some(url.as_str())),
        PostContent::Poll { .. } => (None, None),
    };

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO posts (community_id, author, title, kind, body, url, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            community.community_id,
            author,
            title,
            kind.as_str(),
            body,
            url,
            now_us
        ],
    )?;
    let post_id = tx.last_insert_rowid();

    if let PostContent::Poll { options } = content {
        for (position, label) in options.iter().enumerate() {
            tx.execute(
                "INSERT INTO poll_options (post_id, label, position) VALUES (?1, ?2, ?3)",
                params![post_id, label, position as i64],
            )?;
        }
    }

    tx.commit()?;
    Ok(post_id)
}

/// Add a comment, optionally as a reply to an existing comment.
///
/// The parent must exist and be attached to the same post; both rules are
/// checked before the insert so a bad reply never lands in the store.
///
/// # Errors
///
/// Returns [`WriteError::PostNotFound`], [`WriteError::ParentNotFound`], or
/// [`WriteError::CrossPostParent`] on referential violations.
pub fn create_comment(
    conn: &Connection,
    post_id: i64,
    parent_comment_id: Option<i64>,
    author: &str,
    body: &str,
    now_us: i64,
) -> WriteResult<i64> {
    if !query::post_exists(conn, post_id)? {
        return Err(WriteError::PostNotFound(post_id));
    }

    if let Some(parent_id) = parent_comment_id {
        let parent = query::get_comment(conn, parent_id)?
            .ok_or(WriteError::ParentNotFound(parent_id))?;
        if parent.post_id != post_id {
            return Err(WriteError::CrossPostParent {
                parent_id,
                parent_post_id: parent.post_id,
                post_id,
            });
        }
    }

    conn.execute(
        "INSERT INTO comments (post_id, parent_comment_id, author, body, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![post_id, parent_comment_id, author, body, now_us],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Cast or change a vote. One row per `(user, target)`; re-voting is an
/// upsert that overwrites the stored value.
///
/// # Errors
///
/// Returns [`WriteError::PostNotFound`] or [`WriteError::CommentNotFound`]
/// when the target does not exist.
pub fn cast_vote(
    conn: &Connection,
    user_id: &str,
    target_type: TargetType,
    target_id: i64,
    value: VoteValue,
    now_us: i64,
) -> WriteResult<()> {
    ensure_target_exists(conn, target_type, target_id)?;

    conn.execute(
        "INSERT INTO votes (user_id, target_type, target_id, value, created_at_us) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(user_id, target_type, target_id) DO UPDATE SET \
             value = excluded.value, \
             created_at_us = excluded.created_at_us",
        params![
            user_id,
            target_type.to_string(),
            target_id,
            value.as_i8(),
            now_us
        ],
    )?;
    Ok(())
}

/// Remove the user's vote on a target. Removing a vote that does not exist
/// is a no-op.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn clear_vote(
    conn: &Connection,
    user_id: &str,
    target_type: TargetType,
    target_id: i64,
) -> WriteResult<bool> {
    let removed = conn.execute(
        "DELETE FROM votes WHERE user_id = ?1 AND target_type = ?2 AND target_id = ?3",
        params![user_id, target_type.to_string(), target_id],
    )?;
    Ok(removed > 0)
}

/// Follow a community. Repeat follows are no-ops.
///
/// # Errors
///
/// Returns [`WriteError::CommunityNotFound`] for an unknown name.
pub fn follow_community(
    conn: &Connection,
    user_id: &str,
    community_name: &str,
    now_us: i64,
) -> WriteResult<()> {
    let community = query::get_community_by_name(conn, community_name)?
        .ok_or_else(|| WriteError::CommunityNotFound(community_name.to_owned()))?;

    conn.execute(
        "INSERT OR IGNORE INTO follows (user_id, community_id, created_at_us) \
         VALUES (?1, ?2, ?3)",
        params![user_id, community.community_id, now_us],
    )?;
    Ok(())
}

/// Unfollow a community. Returns whether a follow row was removed.
///
/// # Errors
///
/// Returns [`WriteError::CommunityNotFound`] for an unknown name.
pub fn unfollow_community(
    conn: &Connection,
    user_id: &str,
    community_name: &str,
) -> WriteResult<bool> {
    let community = query::get_community_by_name(conn, community_name)?
        .ok_or_else(|| WriteError::CommunityNotFound(community_name.to_owned()))?;

    let removed = conn.execute(
        "DELETE FROM follows WHERE user_id = ?1 AND community_id = ?2",
        params![user_id, community.community_id],
    )?;
    Ok(removed > 0)
}

/// Save a post to the user's list. Repeat saves are no-ops.
///
/// # Errors
///
/// Returns [`WriteError::PostNotFound`] for an unknown post.
pub fn save_post(conn: &Connection, user_id: &str, post_id: i64, now_us: i64) -> WriteResult<()> {
    if !query::post_exists(conn, post_id)? {
        return Err(WriteError::PostNotFound(post_id));
    }

    conn.execute(
        "INSERT OR IGNORE INTO saved_posts (user_id, post_id, created_at_us) VALUES (?1, ?2, ?3)",
        params![user_id, post_id, now_us],
    )?;
    Ok(())
}

/// Remove a post from the user's saved list.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn unsave_post(conn: &Connection, user_id: &str, post_id: i64) -> WriteResult<bool> {
    let removed = conn.execute(
        "DELETE FROM saved_posts WHERE user_id = ?1 AND post_id = ?2",
        params![user_id, post_id],
    )?;
    Ok(removed > 0)
}

/// Cast a poll ballot. One ballot per `(post, user)`; changing your mind
/// overwrites the earlier choice.
///
/// # Errors
///
/// Returns [`WriteError::NotAPoll`] or [`WriteError::OptionNotOnPost`] on
/// referential violations.
pub fn cast_poll_ballot(
    conn: &Connection,
    user_id: &str,
    post_id: i64,
    option_id: i64,
    now_us: i64,
) -> WriteResult<()> {
    let post =
        query::get_post(conn, post_id)?.ok_or(WriteError::PostNotFound(post_id))?;
    if post.kind != PostKind::Poll.as_str() {
        return Err(WriteError::NotAPoll(post_id));
    }

    let belongs: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM poll_options WHERE option_id = ?1 AND post_id = ?2)",
        params![option_id, post_id],
        |row| row.get(0),
    )?;
    if !belongs {
        return Err(WriteError::OptionNotOnPost { option_id, post_id });
    }

    conn.execute(
        "INSERT INTO poll_ballots (post_id, option_id, user_id, created_at_us) \
         VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(post_id, user_id) DO UPDATE SET \
             option_id = excluded.option_id, \
             created_at_us = excluded.created_at_us",
        params![post_id, option_id, user_id, now_us],
    )?;
    Ok(())
}

/// Store a freshly generated summary together with the timestamp and
/// comment count observed at generation time.
///
/// # Errors
///
/// Returns [`WriteError::PostNotFound`] for an unknown post.
pub fn persist_summary(
    conn: &Connection,
    post_id: i64,
    summary: &str,
    generated_at_us: i64,
    comment_count: i64,
) -> WriteResult<()> {
    let updated = conn.execute(
        "UPDATE posts SET \
             ai_summary = ?2, \
             ai_summary_generated_at_us = ?3, \
             ai_summary_comment_count = ?4 \
         WHERE post_id = ?1",
        params![post_id, summary, generated_at_us, comment_count],
    )?;
    if updated == 0 {
        return Err(WriteError::PostNotFound(post_id));
    }
    Ok(())
}

fn ensure_target_exists(
    conn: &Connection,
    target_type: TargetType,
    target_id: i64,
) -> WriteResult<()> {
    match target_type {
        TargetType::Post => {
            if !query::post_exists(conn, target_id)? {
                return Err(WriteError::PostNotFound(target_id));
            }
        }
        TargetType::Comment => {
            if query::get_comment(conn, target_id)?.is_none() {
                return Err(WriteError::CommentNotFound(target_id));
            }
        }
    }
    Ok(())
}
