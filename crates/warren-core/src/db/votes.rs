//! Batched vote aggregation.
//!
//! The thread read path needs the net score of every comment on the page
//! plus the viewing user's own vote on each. Both are answered with one
//! query per concern over the full id set, never per-row queries.

use crate::model::TargetType;
use anyhow::{Context, Result};
use rusqlite::{Connection, params_from_iter, types::Value};
use std::collections::HashMap;

use super::query::placeholders;

/// Net vote score per target id: `SUM(value)` grouped by target.
///
/// Targets with no votes are absent from the map; callers treat a missing
/// entry as zero. An empty `target_ids` slice returns an empty map without
/// touching storage.
///
/// # Errors
///
/// Returns an error if the aggregation query fails.
pub fn aggregate_votes(
    conn: &Connection,
    target_type: TargetType,
    target_ids: &[i64],
) -> Result<HashMap<i64, i64>> {
    if target_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = placeholders(target_ids.len());
    let sql = format!(
        "SELECT target_id, SUM(value) \
         FROM votes \
         WHERE target_type = ?{type_idx} AND target_id IN ({placeholders}) \
         GROUP BY target_id",
        type_idx = target_ids.len() + 1,
    );

    let mut stmt = conn.prepare(&sql).context("prepare vote aggregation")?;
    let params = bind_ids_then_type(target_ids, target_type);
    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })
        .context("execute vote aggregation")?;

    let mut scores = HashMap::with_capacity(target_ids.len());
    for row in rows {
        let (target_id, score) = row.context("read vote score row")?;
        scores.insert(target_id, score);
    }
    Ok(scores)
}

/// The viewer's own vote on each target, `-1` or `1`.
///
/// Anonymous viewers (`None`) and empty id sets return an empty map
/// without a query. Targets the viewer has not voted on are absent.
///
/// # Errors
///
/// Returns an error if the lookup query fails.
pub fn caller_votes(
    conn: &Connection,
    viewer: Option<&str>,
    target_type: TargetType,
    target_ids: &[i64],
) -> Result<HashMap<i64, i8>> {
    let Some(user_id) = viewer else {
        return Ok(HashMap::new());
    };
    if target_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = placeholders(target_ids.len());
    let n = target_ids.len();
    let sql = format!(
        "SELECT target_id, value \
         FROM votes \
         WHERE target_type = ?{type_idx} AND user_id = ?{user_idx} \
           AND target_id IN ({placeholders})",
        type_idx = n + 1,
        user_idx = n + 2,
    );

    let mut stmt = conn.prepare(&sql).context("prepare caller vote lookup")?;
    let mut params = bind_ids_then_type(target_ids, target_type);
    params.push(Value::Text(user_id.to_owned()));
    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i8>(1)?))
        })
        .context("execute caller vote lookup")?;

    let mut votes = HashMap::new();
    for row in rows {
        let (target_id, value) = row.context("read caller vote row")?;
        votes.insert(target_id, value);
    }
    Ok(votes)
}

fn bind_ids_then_type(target_ids: &[i64], target_type: TargetType) -> Vec<Value> {
    let mut params: Vec<Value> = target_ids.iter().map(|id| Value::Integer(*id)).collect();
    params.push(Value::Text(target_type.as_str().to_owned()));
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations;
    use rusqlite::params;

    fn test_db() -> Connection {
        let mut conn = Connection::open_in_memory().expect("open in-memory db");
        migrations::migrate(&mut conn).expect("migrate");
        conn
    }

    fn cast(conn: &Connection, user: &str, target_type: &str, target_id: i64, value: i64) {
        conn.execute(
            "INSERT INTO votes (user_id, target_type, target_id, value, created_at_us) \
             VALUES (?1, ?2, ?3, ?4, 100) \
             ON CONFLICT(user_id, target_type, target_id) DO UPDATE SET value = excluded.value",
            params![user, target_type, target_id, value],
        )
        .expect("cast vote");
    }

    #[test]
    fn aggregate_sums_per_target() {
        let conn = test_db();
        cast(&conn, "alice", "comment", 1, 1);
        cast(&conn, "bob", "comment", 1, 1);
        cast(&conn, "carol", "comment", 1, 1);
        cast(&conn, "alice", "comment", 2, -1);
        cast(&conn, "bob", "comment", 2, -1);

        let scores = aggregate_votes(&conn, TargetType::Comment, &[1, 2, 3]).unwrap();
        assert_eq!(scores.get(&1), Some(&3));
        assert_eq!(scores.get(&2), Some(&-2));
        assert_eq!(scores.get(&3), None, "unvoted target must be absent");
    }

    #[test]
    fn aggregate_empty_ids_short_circuits() {
        let conn = test_db();
        cast(&conn, "alice", "comment", 1, 1);

        let scores = aggregate_votes(&conn, TargetType::Comment, &[]).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn aggregate_scopes_by_target_type() {
        let conn = test_db();
        cast(&conn, "alice", "post", 1, 1);
        cast(&conn, "alice", "comment", 1, -1);

        let scores = aggregate_votes(&conn, TargetType::Post, &[1]).unwrap();
        assert_eq!(scores.get(&1), Some(&1));
    }

    #[test]
    fn revote_overwrites_instead_of_appending() {
        let conn = test_db();
        cast(&conn, "alice", "comment", 1, 1);
        cast(&conn, "alice", "comment", 1, -1);

        let scores = aggregate_votes(&conn, TargetType::Comment, &[1]).unwrap();
        assert_eq!(scores.get(&1), Some(&-1));
    }

    #[test]
    fn caller_votes_only_for_viewer() {
        let conn = test_db();
        cast(&conn, "alice", "comment", 1, 1);
        cast(&conn, "bob", "comment", 1, -1);
        cast(&conn, "bob", "comment", 2, 1);

        let votes = caller_votes(&conn, Some("bob"), TargetType::Comment, &[1, 2, 3]).unwrap();
        assert_eq!(votes.get(&1), Some(&-1));
        assert_eq!(votes.get(&2), Some(&1));
        assert_eq!(votes.get(&3), None);
    }

    #[test]
    fn caller_votes_anonymous_is_empty() {
        let conn = test_db();
        cast(&conn, "alice", "comment", 1, 1);

        let votes = caller_votes(&conn, None, TargetType::Comment, &[1]).unwrap();
        assert!(votes.is_empty());
    }

    #[test]
    fn caller_votes_empty_ids_short_circuits() {
        let conn = test_db();
        let votes = caller_votes(&conn, Some("bob"), TargetType::Comment, &[]).unwrap();
        assert!(votes.is_empty());
    }
}
