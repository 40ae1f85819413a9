use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::path::Path;

use crate::output::{OutputMode, render};
use crate::summarizer;
use crate::validate::parse_id;
use warren_core::summary::SummaryPolicy;
use warren_core::thread::refresh_summary;

use super::{now_us, open_project};

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Post id.
    pub post_id: String,
}

#[derive(Debug, Serialize)]
struct SummaryOut {
    post_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
}

/// Execute `wrn summary`: the post's AI summary, regenerated first when
/// the freshness policy says it is stale.
///
/// Works without a configured endpoint: stored summaries are served
/// as-is, and a missing one renders as unavailable rather than an error.
///
/// # Errors
///
/// Fails on an invalid or unknown post id.
pub fn run_summary(args: &SummaryArgs, output: OutputMode, invoked_from: &Path) -> Result<()> {
    let post_id = parse_id(&args.post_id)?;
    let project = open_project(invoked_from)?;

    let service = summarizer::from_config(&project.config.summary);
    let policy = SummaryPolicy::from_config(&project.config.summary);

    let summary = refresh_summary(
        &project.conn,
        service.as_ref(),
        &policy,
        &project.config.thread,
        post_id,
        now_us(),
    )?;

    let out = SummaryOut { post_id, summary };
    render(output, &out, |o, w| match &o.summary {
        Some(text) => writeln!(w, "{text}"),
        None => writeln!(w, "No summary available for post {post_id}."),
    })
}
