use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Per-project configuration loaded from `.warren/config.toml`.
///
/// Every section and field is optional; missing values fall back to the
/// defaults below, so a fresh project needs no config file at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub thread: ThreadConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
}

/// Tuning for the comment-thread read path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadConfig {
    /// Top-level comment page size. Replies of comments beyond this page
    /// are not fetched, which is why orphaned replies can be dropped from
    /// the forest.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Built-forest cache TTL in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl ThreadConfig {
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Staleness bounds for AI thread summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Regenerate once a summary is older than this many hours.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
    /// Regenerate once this many comments arrived since generation.
    #[serde(default = "default_comment_delta")]
    pub comment_delta: i64,
    /// HTTP endpoint of the external summarization service. When unset,
    /// summaries are never generated and stored ones are served as-is.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_age_hours: default_max_age_hours(),
            comment_delta: default_comment_delta(),
            endpoint: None,
        }
    }
}

pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".warren/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

const fn default_page_size() -> u32 {
    50
}

const fn default_cache_ttl_secs() -> u64 {
    120
}

const fn default_max_age_hours() -> u64 {
    24
}

const fn default_comment_delta() -> i64 {
    3
}
