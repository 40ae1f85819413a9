//! `SQLite` query helpers for the warren store.
//!
//! Provides typed Rust structs and composable query functions for the read
//! paths: communities, post listings, the two comment row fetches behind
//! the thread view (top-level page + direct replies), poll options and
//! ballot counts, follows, and saved posts.
//!
//! All functions take a shared `&Connection` reference and return
//! `anyhow::Result<T>` with typed structs (never raw rows).

use anyhow::{Context, Result};
use rusqlite::{Connection, params, params_from_iter};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// A community row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryCommunity {
    pub community_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at_us: i64,
}

/// A post row, including the AI-summary metadata triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPost {
    pub post_id: i64,
    pub community_id: i64,
    pub author: String,
    pub title: String,
    pub kind: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_summary_generated_at_us: Option<i64>,
    pub ai_summary_comment_count: i64,
    pub created_at_us: i64,
}

/// A flat comment row; `parent_comment_id` is `None` for top-level comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryComment {
    pub comment_id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub author: String,
    pub body: String,
    pub created_at_us: i64,
}

/// A poll option with its ballot count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPollOption {
    pub option_id: i64,
    pub post_id: i64,
    pub label: String,
    pub position: i64,
    pub ballots: i64,
}

/// Quick structural check used by graceful-recovery open paths.
#[must_use]
pub fn store_schema_ok(conn: &Connection) -> bool {
    conn.query_row("SELECT schema_version FROM store_meta WHERE id = 1", [], |row| {
        row.get::<_, i64>(0)
    })
    .is_ok()
}

// ---------------------------------------------------------------------------
// Communities
// ---------------------------------------------------------------------------

/// Fetch a community by exact name.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_community_by_name(conn: &Connection, name: &str) -> Result<Option<QueryCommunity>> {
    let sql = "SELECT community_id, name, description, created_by, created_at_us \
               FROM communities WHERE name = ?1";

    let result = conn.query_row(sql, params![name], row_to_community);
    match result {
        Ok(community) => Ok(Some(community)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context(format!("get_community_by_name for '{name}'")),
    }
}

/// List all communities, alphabetical.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_communities(conn: &Connection) -> Result<Vec<QueryCommunity>> {
    let sql = "SELECT community_id, name, description, created_by, created_at_us \
               FROM communities ORDER BY name";

    let mut stmt = conn.prepare(sql).context("prepare list_communities")?;
    let rows = stmt
        .query_map([], row_to_community)
        .context("execute list_communities")?;

    let mut communities = Vec::new();
    for row in rows {
        communities.push(row.context("read community row")?);
    }
    Ok(communities)
}

/// Community names followed by a user, alphabetical.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn followed_communities(conn: &Connection, user_id: &str) -> Result<Vec<QueryCommunity>> {
    let sql = "SELECT c.community_id, c.name, c.description, c.created_by, c.created_at_us \
               FROM communities c \
               INNER JOIN follows f ON f.community_id = c.community_id \
               WHERE f.user_id = ?1 \
               ORDER BY c.name";

    let mut stmt = conn.prepare(sql).context("prepare followed_communities")?;
    let rows = stmt
        .query_map(params![user_id], row_to_community)
        .context("execute followed_communities")?;

    let mut communities = Vec::new();
    for row in rows {
        communities.push(row.context("read followed community row")?);
    }
    Ok(communities)
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// Fetch a single post by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_post(conn: &Connection, post_id: i64) -> Result<Option<QueryPost>> {
    let sql = "SELECT post_id, community_id, author, title, kind, body, url, \
               ai_summary, ai_summary_generated_at_us, ai_summary_comment_count, created_at_us \
               FROM posts WHERE post_id = ?1";

    let result = conn.query_row(sql, params![post_id], row_to_post);
    match result {
        Ok(post) => Ok(Some(post)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context(format!("get_post for {post_id}")),
    }
}

/// List posts, newest first, optionally restricted to one community.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn list_posts(
    conn: &Connection,
    community_id: Option<i64>,
    limit: u32,
    offset: u32,
) -> Result<Vec<QueryPost>> {
    let mut sql = String::from(
        "SELECT post_id, community_id, author, title, kind, body, url, \
         ai_summary, ai_summary_generated_at_us, ai_summary_comment_count, created_at_us \
         FROM posts",
    );
    if community_id.is_some() {
        sql.push_str(" WHERE community_id = ?1");
    }
    sql.push_str(" ORDER BY created_at_us DESC, post_id DESC LIMIT ?2 OFFSET ?3");

    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("prepare list_posts query: {sql}"))?;

    let rows = if let Some(cid) = community_id {
        stmt.query_map(params![cid, limit, offset], row_to_post)
    } else {
        // Placeholders are positional; bind a dummy for the unused ?1.
        stmt.query_map(params![0_i64, limit, offset], row_to_post)
    }
    .context("execute list_posts query")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row.context("read list_posts row")?);
    }
    Ok(posts)
}

/// Posts saved by a user, most recently saved first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn saved_posts(conn: &Connection, user_id: &str) -> Result<Vec<QueryPost>> {
    let sql = "SELECT p.post_id, p.community_id, p.author, p.title, p.kind, p.body, p.url, \
               p.ai_summary, p.ai_summary_generated_at_us, p.ai_summary_comment_count, p.created_at_us \
               FROM posts p \
               INNER JOIN saved_posts s ON s.post_id = p.post_id \
               WHERE s.user_id = ?1 \
               ORDER BY s.created_at_us DESC";

    let mut stmt = conn.prepare(sql).context("prepare saved_posts")?;
    let rows = stmt
        .query_map(params![user_id], row_to_post)
        .context("execute saved_posts")?;

    let mut posts = Vec::new();
    for row in rows {
        posts.push(row.context("read saved post row")?);
    }
    Ok(posts)
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// Fetch a single comment by id.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn get_comment(conn: &Connection, comment_id: i64) -> Result<Option<QueryComment>> {
    let sql = "SELECT comment_id, post_id, parent_comment_id, author, body, created_at_us \
               FROM comments WHERE comment_id = ?1";

    let result = conn.query_row(sql, params![comment_id], row_to_comment);
    match result {
        Ok(comment) => Ok(Some(comment)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e).context(format!("get_comment for {comment_id}")),
    }
}

/// The capped top-level comment page for a post, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn top_level_comments(conn: &Connection, post_id: i64, limit: u32) -> Result<Vec<QueryComment>> {
    let sql = "SELECT comment_id, post_id, parent_comment_id, author, body, created_at_us \
               FROM comments \
               WHERE post_id = ?1 AND parent_comment_id IS NULL \
               ORDER BY created_at_us DESC, comment_id DESC \
               LIMIT ?2";

    let mut stmt = conn.prepare(sql).context("prepare top_level_comments")?;
    let rows = stmt
        .query_map(params![post_id, limit], row_to_comment)
        .context("execute top_level_comments")?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row.context("read top-level comment row")?);
    }
    Ok(comments)
}

/// Direct replies of the given parent comments, newest first.
///
/// Empty `parent_ids` short-circuits without touching storage; a reply
/// whose parent missed the top-level page is therefore never fetched,
/// which is what lets the forest builder drop it.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn direct_replies(conn: &Connection, parent_ids: &[i64]) -> Result<Vec<QueryComment>> {
    if parent_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = placeholders(parent_ids.len());
    let sql = format!(
        "SELECT comment_id, post_id, parent_comment_id, author, body, created_at_us \
         FROM comments \
         WHERE parent_comment_id IN ({placeholders}) \
         ORDER BY created_at_us DESC, comment_id DESC"
    );

    let mut stmt = conn.prepare(&sql).context("prepare direct_replies")?;
    let rows = stmt
        .query_map(params_from_iter(parent_ids.iter()), row_to_comment)
        .context("execute direct_replies")?;

    let mut comments = Vec::new();
    for row in rows {
        comments.push(row.context("read reply row")?);
    }
    Ok(comments)
}

/// Count all comments on a post (any depth).
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn comment_count(conn: &Connection, post_id: i64) -> Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM comments WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )
    .context("count comments")
}

// ---------------------------------------------------------------------------
// Polls
// ---------------------------------------------------------------------------

/// Poll options for a post in declared order, with ballot counts.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn poll_options(conn: &Connection, post_id: i64) -> Result<Vec<QueryPollOption>> {
    let sql = "SELECT o.option_id, o.post_id, o.label, o.position, \
               (SELECT COUNT(*) FROM poll_ballots b WHERE b.option_id = o.option_id) \
               FROM poll_options o \
               WHERE o.post_id = ?1 \
               ORDER BY o.position";

    let mut stmt = conn.prepare(sql).context("prepare poll_options")?;
    let rows = stmt
        .query_map(params![post_id], |row| {
            Ok(QueryPollOption {
                option_id: row.get(0)?,
                post_id: row.get(1)?,
                label: row.get(2)?,
                position: row.get(3)?,
                ballots: row.get(4)?,
            })
        })
        .context("execute poll_options")?;

    let mut options = Vec::new();
    for row in rows {
        options.push(row.context("read poll option row")?);
    }
    Ok(options)
}

// ---------------------------------------------------------------------------
// Existence checks
// ---------------------------------------------------------------------------

/// Check if a post exists.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn post_exists(conn: &Connection, post_id: i64) -> Result<bool> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM posts WHERE post_id = ?1)",
            params![post_id],
            |row| row.get(0),
        )
        .context("check post_exists")?;
    Ok(exists)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// `?1, ?2, ...` list for dynamic IN clauses.
pub(crate) fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Count ballots per option id for a poll. Targets with zero ballots are
/// absent from the map.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn poll_ballot_counts(conn: &Connection, post_id: i64) -> Result<HashMap<i64, i64>> {
    let sql = "SELECT option_id, COUNT(*) FROM poll_ballots WHERE post_id = ?1 GROUP BY option_id";
    let mut stmt = conn.prepare(sql).context("prepare poll_ballot_counts")?;
    let rows = stmt.query_map(params![post_id], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = HashMap::new();
    for row in rows {
        let (option_id, count) = row.context("read ballot count")?;
        counts.insert(option_id, count);
    }
    Ok(counts)
}

fn row_to_community(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueryCommunity> {
    Ok(QueryCommunity {
        community_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_by: row.get(3)?,
        created_at_us: row.get(4)?,
    })
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueryPost> {
    Ok(QueryPost {
        post_id: row.get(0)?,
        community_id: row.get(1)?,
        author: row.get(2)?,
        title: row.get(3)?,
        kind: row.get(4)?,
        body: row.get(5)?,
        url: row.get(6)?,
        ai_summary: row.get(7)?,
        ai_summary_generated_at_us: row.get(8)?,
        ai_summary_comment_count: row.get(9)?,
        created_at_us: row.get(10)?,
    })
}

fn row_to_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<QueryComment> {
    Ok(QueryComment {
        comment_id: row.get(0)?,
        post_id: row.get(1)?,
        parent_comment_id: row.get(2)?,
        author: row.get(3)?,
        body: row.get(4)?,
        created_at_us: row.get(5)?,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
