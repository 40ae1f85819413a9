//! Thread read path and the mutations that feed it.
//!
//! `load_thread` is the hot path: cache probe, two comment fetches (the
//! top-level page, then the direct replies of that page), two batched
//! vote lookups, forest assembly, cache fill. Cache failures on either
//! side are logged and absorbed so the thread always renders from the
//! store.

use crate::cache::{CacheKey, ThreadCache};
use crate::config::ThreadConfig;
use crate::db::query::{self, QueryComment};
use crate::db::votes;
use crate::db::write::{self, WriteError};
use crate::forest::{CommentNode, build_forest};
use crate::model::{TargetType, VoteValue};
use crate::summary::{
    SummaryComment, SummaryPolicy, SummaryRequest, Summarizer, needs_regeneration,
};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ThreadError {
    #[error("post {0} not found")]
    PostNotFound(i64),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error(transparent)]
    Db(#[from] anyhow::Error),
}

/// The rendered thread for one `(post, viewer)` pair.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadView {
    pub comments: Vec<CommentNode>,
}

/// Load the comment thread for a post as seen by `viewer`.
///
/// # Errors
///
/// Returns [`ThreadError::PostNotFound`] for an unknown post, or a
/// database error. Cache failures never surface here.
pub fn load_thread(
    conn: &Connection,
    cache: &dyn ThreadCache,
    config: &ThreadConfig,
    post_id: i64,
    viewer: Option<&str>,
) -> Result<ThreadView, ThreadError> {
    let key = CacheKey::new(post_id, viewer);

    match cache.get(&key) {
        Ok(Some(forest)) => {
            tracing::debug!(post_id, "thread cache hit");
            return Ok(ThreadView { comments: forest });
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(post_id, error = %e, "thread cache read failed"),
    }

    if !query::post_exists(conn, post_id)? {
        return Err(ThreadError::PostNotFound(post_id));
    }

    let rows = fetch_thread_rows(conn, config, post_id)?;
    let comment_ids: Vec<i64> = rows.iter().map(|c| c.comment_id).collect();

    let scores = votes::aggregate_votes(conn, TargetType::Comment, &comment_ids)?;
    let viewer_votes = votes::caller_votes(conn, viewer, TargetType::Comment, &comment_ids)?;

    let forest = build_forest(&rows, &scores, &viewer_votes);

    if let Err(e) = cache.set(key, forest.clone()) {
        tracing::warn!(post_id, error = %e, "thread cache write failed");
    }

    Ok(ThreadView { comments: forest })
}

/// Add a comment (or reply) and invalidate every cached view of the post.
///
/// # Errors
///
/// Returns a [`WriteError`] on referential violations.
pub fn add_comment(
    conn: &Connection,
    cache: &dyn ThreadCache,
    post_id: i64,
    parent_comment_id: Option<i64>,
    author: &str,
    body: &str,
    now_us: i64,
) -> Result<i64, ThreadError> {
    let comment_id = write::create_comment(conn, post_id, parent_comment_id, author, body, now_us)?;
    invalidate(cache, post_id);
    Ok(comment_id)
}

/// Cast or change a vote and invalidate the containing post's cached
/// views. A vote on a comment invalidates the comment's post.
///
/// # Errors
///
/// Returns a [`WriteError`] when the target does not exist.
pub fn cast_vote(
    conn: &Connection,
    cache: &dyn ThreadCache,
    user_id: &str,
    target_type: TargetType,
    target_id: i64,
    value: VoteValue,
    now_us: i64,
) -> Result<(), ThreadError> {
    write::cast_vote(conn, user_id, target_type, target_id, value, now_us)?;
    invalidate(cache, containing_post(conn, target_type, target_id)?);
    Ok(())
}

/// Remove a vote and invalidate the containing post's cached views.
///
/// # Errors
///
/// Returns a [`WriteError`] when the target does not exist.
pub fn clear_vote(
    conn: &Connection,
    cache: &dyn ThreadCache,
    user_id: &str,
    target_type: TargetType,
    target_id: i64,
) -> Result<bool, ThreadError> {
    let post_id = containing_post(conn, target_type, target_id)?;
    let removed = write::clear_vote(conn, user_id, target_type, target_id)?;
    if removed {
        invalidate(cache, post_id);
    }
    Ok(removed)
}

/// Serve the post's summary, regenerating it first when the freshness
/// policy says it is stale.
///
/// Summarizer failures are absorbed: the previous summary (or `None`) is
/// served and the stored record stays untouched, so the next read retries.
///
/// # Errors
///
/// Returns [`ThreadError::PostNotFound`] for an unknown post, or a
/// database error.
pub fn refresh_summary(
    conn: &Connection,
    summarizer: &dyn Summarizer,
    policy: &SummaryPolicy,
    config: &ThreadConfig,
    post_id: i64,
    now_us: i64,
) -> Result<Option<String>, ThreadError> {
    let post = query::get_post(conn, post_id)?.ok_or(ThreadError::PostNotFound(post_id))?;
    let current_count = query::comment_count(conn, post_id)?;

    let stale = needs_regeneration(
        post.ai_summary.as_deref(),
        post.ai_summary_generated_at_us,
        post.ai_summary_comment_count,
        current_count,
        now_us,
        policy,
    );
    if !stale {
        return Ok(post.ai_summary);
    }

    let request = build_summary_request(conn, config, &post)?;
    match summarizer.summarize(&request) {
        Ok(summary) => {
            write::persist_summary(conn, post_id, &summary, now_us, current_count)?;
            Ok(Some(summary))
        }
        Err(e) => {
            tracing::warn!(post_id, error = %e, "summary generation failed, serving stored summary");
            Ok(post.ai_summary)
        }
    }
}

fn fetch_thread_rows(
    conn: &Connection,
    config: &ThreadConfig,
    post_id: i64,
) -> Result<Vec<QueryComment>, ThreadError> {
    let mut rows = query::top_level_comments(conn, post_id, config.page_size)?;
    let parent_ids: Vec<i64> = rows.iter().map(|c| c.comment_id).collect();
    rows.extend(query::direct_replies(conn, &parent_ids)?);
    Ok(rows)
}

fn build_summary_request(
    conn: &Connection,
    config: &ThreadConfig,
    post: &query::QueryPost,
) -> Result<SummaryRequest, ThreadError> {
    let rows = fetch_thread_rows(conn, config, post.post_id)?;
    let comment_ids: Vec<i64> = rows.iter().map(|c| c.comment_id).collect();
    let scores = votes::aggregate_votes(conn, TargetType::Comment, &comment_ids)?;
    let post_score = votes::aggregate_votes(conn, TargetType::Post, &[post.post_id])?;

    Ok(SummaryRequest {
        title: post.title.clone(),
        body: post.body.clone(),
        vote_count: post_score.get(&post.post_id).copied().unwrap_or(0),
        comments: rows
            .into_iter()
            .map(|c| SummaryComment {
                vote_count: scores.get(&c.comment_id).copied().unwrap_or(0),
                body: c.body,
                author: c.author,
                created_at: c.created_at_us,
            })
            .collect(),
    })
}

fn containing_post(
    conn: &Connection,
    target_type: TargetType,
    target_id: i64,
) -> Result<i64, ThreadError> {
    match target_type {
        TargetType::Post => Ok(target_id),
        TargetType::Comment => query::get_comment(conn, target_id)?
            .map(|c| c.post_id)
            .ok_or(ThreadError::Write(WriteError::CommentNotFound(target_id))),
    }
}

fn invalidate(cache: &dyn ThreadCache, post_id: i64) {
    match cache.invalidate_post(post_id) {
        Ok(removed) => tracing::debug!(post_id, removed, "invalidated cached thread views"),
        Err(e) => tracing::warn!(post_id, error = %e, "thread cache invalidation failed"),
    }
}
