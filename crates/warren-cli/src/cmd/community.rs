use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, render};
use crate::user::require_user;
use crate::validate::validate_community_name;
use warren_core::db::{query, write};

use super::{now_us, open_project};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Community name (lowercase letters, digits, '-' and '_').
    pub name: String,

    /// Optional one-line description.
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct FollowArgs {
    /// Community name.
    pub name: String,
}

#[derive(Debug, Serialize)]
struct CommunityOut {
    community_id: i64,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    created_by: String,
    created_at_us: i64,
}

impl From<query::QueryCommunity> for CommunityOut {
    fn from(c: query::QueryCommunity) -> Self {
        Self {
            community_id: c.community_id,
            name: c.name,
            description: c.description,
            created_by: c.created_by,
            created_at_us: c.created_at_us,
        }
    }
}

/// Execute `wrn community create`.
///
/// # Errors
///
/// Fails on an invalid name, a duplicate name, or a missing user identity.
pub fn run_create(
    args: &CreateArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    validate_community_name(&args.name)?;
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    let community_id = write::create_community(
        &project.conn,
        &args.name,
        args.description.as_deref(),
        &user,
        now_us(),
    )?;

    let created = query::get_community_by_name(&project.conn, &args.name)?
        .map(CommunityOut::from)
        .ok_or_else(|| anyhow::anyhow!("community {community_id} vanished after create"))?;

    render(output, &created, |c, w| {
        writeln!(w, "✓ Created community '{}' (id {})", c.name, c.community_id)
    })
}

/// Execute `wrn community list`.
///
/// # Errors
///
/// Fails if the project cannot be opened.
pub fn run_list(output: OutputMode, invoked_from: &Path) -> Result<()> {
    let project = open_project(invoked_from)?;
    let communities: Vec<CommunityOut> = query::list_communities(&project.conn)?
        .into_iter()
        .map(CommunityOut::from)
        .collect();

    render(output, &communities, |list, w| {
        if list.is_empty() {
            writeln!(w, "No communities yet. Create one with `wrn community create`.")
        } else {
            for c in list {
                match &c.description {
                    Some(desc) => writeln!(w, "{}  {}", c.name, desc)?,
                    None => writeln!(w, "{}", c.name)?,
                }
            }
            Ok(())
        }
    })
}

/// Execute `wrn community follow`.
///
/// # Errors
///
/// Fails on an unknown community or missing user identity.
pub fn run_follow(
    args: &FollowArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    write::follow_community(&project.conn, &user, &args.name, now_us())?;

    let result = serde_json::json!({ "community": args.name, "following": true });
    render(output, &result, |_, w| {
        writeln!(w, "✓ Following '{}'", args.name)
    })
}

/// Execute `wrn community unfollow`.
///
/// # Errors
///
/// Fails on an unknown community or missing user identity.
pub fn run_unfollow(
    args: &FollowArgs,
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    let removed = write::unfollow_community(&project.conn, &user, &args.name)?;

    let result = serde_json::json!({ "community": args.name, "following": false });
    render(output, &result, |_, w| {
        if removed {
            writeln!(w, "✓ Unfollowed '{}'", args.name)
        } else {
            writeln!(w, "You were not following '{}'", args.name)
        }
    })
}

/// Execute `wrn community following`: list communities the user follows.
///
/// # Errors
///
/// Fails on a missing user identity.
pub fn run_following(
    user_flag: Option<&str>,
    output: OutputMode,
    invoked_from: &Path,
) -> Result<()> {
    let user = require_user(user_flag)?;
    let project = open_project(invoked_from)?;

    let communities: Vec<CommunityOut> = query::followed_communities(&project.conn, &user)?
        .into_iter()
        .map(CommunityOut::from)
        .collect();

    render(output, &communities, |list, w| {
        if list.is_empty() {
            writeln!(w, "Not following any communities.")
        } else {
            for c in list {
                writeln!(w, "{}", c.name)?;
            }
            Ok(())
        }
    })
}
