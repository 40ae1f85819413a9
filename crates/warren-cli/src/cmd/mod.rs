//! Command handlers, one module per command family.
//!
//! Every handler receives parsed args, the resolved output mode, and the
//! directory the command was invoked from. Project discovery walks up
//! from there looking for a `.warren/` directory, so commands work from
//! any subdirectory of a project.

pub mod comment;
pub mod community;
pub mod init;
pub mod poll;
pub mod post;
pub mod summary;
pub mod thread;
pub mod vote;

use anyhow::Result;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use warren_core::cache::MemoryThreadCache;
use warren_core::config::{ProjectConfig, load_project_config};
use warren_core::db;

/// Name of the store database inside `.warren/`.
pub const STORE_FILE: &str = "warren.db";

/// Raised when no `.warren/` directory exists at or above the invocation
/// directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotInitialized {
    pub searched_from: PathBuf,
}

impl std::fmt::Display for NotInitialized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "no warren project found at or above {}",
            self.searched_from.display()
        )
    }
}

impl std::error::Error for NotInitialized {}

/// An opened project: its root, a live store connection, and config.
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    pub conn: Connection,
    pub config: ProjectConfig,
}

impl Project {
    /// In-process thread cache sized from the project's TTL setting.
    #[must_use]
    pub fn thread_cache(&self) -> MemoryThreadCache {
        MemoryThreadCache::new(Duration::from_secs(self.config.thread.cache_ttl_secs))
    }
}

/// Walk up from `start` looking for a directory containing `.warren/`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if dir.join(".warren").is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}

/// Locate and open the project for a command invocation.
///
/// # Errors
///
/// Returns [`NotInitialized`] when no project (or a corrupt store) is
/// found, or a config/database error.
pub fn open_project(start: &Path) -> Result<Project> {
    let root = find_project_root(start).ok_or_else(|| NotInitialized {
        searched_from: start.to_path_buf(),
    })?;

    let store_path = root.join(".warren").join(STORE_FILE);
    let conn = db::try_open_store(&store_path)?.ok_or_else(|| NotInitialized {
        searched_from: start.to_path_buf(),
    })?;

    let config = load_project_config(&root)?;
    Ok(Project { root, conn, config })
}

/// Current wall-clock time in microseconds since the Unix epoch.
#[must_use]
pub fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_project_root_walks_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        std::fs::create_dir_all(root.join(".warren")).expect("mkdir .warren");
        let nested = root.join("a/b/c");
        std::fs::create_dir_all(&nested).expect("mkdir nested");

        let found = find_project_root(&nested).expect("root found");
        assert_eq!(found, root);
    }

    #[test]
    fn find_project_root_none_without_marker() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(find_project_root(dir.path()).is_none());
    }

    #[test]
    fn open_project_requires_init() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = open_project(dir.path()).unwrap_err();
        assert!(err.downcast_ref::<NotInitialized>().is_some());
    }

    #[test]
    fn open_project_after_init() {
        let dir = tempfile::tempdir().expect("tempdir");
        init::run_init(&init::InitArgs { force: false }, dir.path()).expect("init");

        let project = open_project(dir.path()).expect("open");
        assert_eq!(project.root, dir.path());
        assert_eq!(project.config.thread.page_size, 50);
    }
}
