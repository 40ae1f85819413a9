//! HTTP-backed summarizer client.
//!
//! Talks to the summarization service configured in
//! `[summary].endpoint`. The service receives the thread snapshot as JSON
//! and answers `{"summary": "..."}`. When no endpoint is configured the
//! [`NoopSummarizer`] stands in; its permanent failure is absorbed by the
//! read path, so stored summaries are served as-is and nothing breaks.

use serde::Deserialize;
use std::time::Duration;
use warren_core::config::SummaryConfig;
use warren_core::summary::{SummaryError, SummaryRequest, Summarizer};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

pub struct HttpSummarizer {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpSummarizer {
    #[must_use]
    pub fn new(endpoint: String) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .build();
        Self { endpoint, agent }
    }
}

impl Summarizer for HttpSummarizer {
    fn summarize(&self, request: &SummaryRequest) -> Result<String, SummaryError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .send_json(request)
            .map_err(|e| SummaryError::Unavailable(e.to_string()))?;

        let parsed: SummaryResponse = response
            .into_json()
            .map_err(|e| SummaryError::MalformedResponse(e.to_string()))?;

        if parsed.summary.trim().is_empty() {
            return Err(SummaryError::MalformedResponse(
                "empty summary text".to_string(),
            ));
        }
        Ok(parsed.summary)
    }
}

/// Summarizer used when no endpoint is configured.
pub struct NoopSummarizer;

impl Summarizer for NoopSummarizer {
    fn summarize(&self, _request: &SummaryRequest) -> Result<String, SummaryError> {
        Err(SummaryError::Unavailable(
            "no summarization endpoint configured".to_string(),
        ))
    }
}

/// Build the summarizer matching the project configuration.
#[must_use]
pub fn from_config(config: &SummaryConfig) -> Box<dyn Summarizer> {
    config.endpoint.as_ref().map_or_else(
        || Box::new(NoopSummarizer) as Box<dyn Summarizer>,
        |endpoint| Box::new(HttpSummarizer::new(endpoint.clone())) as Box<dyn Summarizer>,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_always_fails() {
        let request = SummaryRequest {
            title: "t".into(),
            body: None,
            vote_count: 0,
            comments: Vec::new(),
        };
        let err = NoopSummarizer.summarize(&request).unwrap_err();
        assert!(matches!(err, SummaryError::Unavailable(_)));
    }

    #[test]
    fn unreachable_endpoint_reports_unavailable() {
        // Reserved TEST-NET address; nothing listens there.
        let summarizer = HttpSummarizer::new("http://192.0.2.1:1/summarize".to_string());
        let request = SummaryRequest {
            title: "t".into(),
            body: None,
            vote_count: 0,
            comments: Vec::new(),
        };
        let err = summarizer.summarize(&request).unwrap_err();
        assert!(matches!(err, SummaryError::Unavailable(_)));
    }

    #[test]
    fn from_config_selects_backend() {
        let noop = from_config(&SummaryConfig::default());
        assert!(noop
            .summarize(&SummaryRequest {
                title: "t".into(),
                body: None,
                vote_count: 0,
                comments: Vec::new(),
            })
            .is_err());
    }
}
