//! AI thread summaries: freshness policy and the summarizer port.
//!
//! The store keeps three facts per post: the summary text, when it was
//! generated, and how many comments existed at that moment. The policy
//! here decides from those facts alone whether a new generation is due;
//! actually producing text is behind the [`Summarizer`] trait so the core
//! never talks HTTP itself.

use crate::config::SummaryConfig;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

const MICROS_PER_HOUR: i64 = 3_600_000_000;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("summarization service unavailable: {0}")]
    Unavailable(String),
    #[error("summarization service returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// When a stored summary is considered stale.
#[derive(Debug, Clone, Copy)]
pub struct SummaryPolicy {
    pub max_age: Duration,
    pub comment_delta: i64,
}

impl SummaryPolicy {
    #[must_use]
    pub const fn from_config(config: &SummaryConfig) -> Self {
        Self {
            max_age: Duration::from_secs(config.max_age_hours * 3600),
            comment_delta: config.comment_delta,
        }
    }

    const fn max_age_us(&self) -> i64 {
        self.max_age.as_secs() as i64 * 1_000_000
    }
}

impl Default for SummaryPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(24 * 3600),
            comment_delta: 3,
        }
    }
}

/// Decide whether a post's summary must be (re)generated.
///
/// Regeneration is due when any of these holds:
/// - no summary is stored
/// - a summary exists but carries no generation timestamp
/// - the summary is older than the policy's maximum age
/// - at least `comment_delta` comments arrived since generation
///
/// A summary exactly at the age bound is still fresh; one microsecond
/// past it is stale. The comment delta compares against the count stored
/// at generation time, so deletions can make the delta negative, which
/// never triggers regeneration.
#[must_use]
pub fn needs_regeneration(
    summary: Option<&str>,
    generated_at_us: Option<i64>,
    count_at_generation: i64,
    current_count: i64,
    now_us: i64,
    policy: &SummaryPolicy,
) -> bool {
    if summary.is_none() {
        return true;
    }
    let Some(generated_at) = generated_at_us else {
        return true;
    };

    if now_us - generated_at > policy.max_age_us() {
        return true;
    }

    current_count - count_at_generation >= policy.comment_delta
}

/// Request payload sent to the summarization service. Field names follow
/// the service's wire contract, hence camelCase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    pub title: String,
    pub body: Option<String>,
    pub vote_count: i64,
    pub comments: Vec<SummaryComment>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryComment {
    pub body: String,
    pub author: String,
    pub vote_count: i64,
    pub created_at: i64,
}

/// Port to whatever produces summary text.
pub trait Summarizer {
    /// Generate a summary for the given thread snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError`] when the service is unreachable or its
    /// response cannot be used.
    fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryError>;
}
