use anyhow::{Context as _, Result};
use clap::Args;
use std::path::Path;
use warren_core::db;

use super::STORE_FILE;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force re-initialization even if `.warren/` already exists.
    #[arg(long)]
    pub force: bool,
}

const CONFIG_TOML: &str = "[thread]\n\
    page_size = 50\n\
    cache_ttl_secs = 120\n\
    \n\
    [summary]\n\
    max_age_hours = 24\n\
    comment_delta = 3\n\
    # endpoint = \"http://localhost:9000/summarize\"\n";

const GITIGNORE: &str = "warren.db\nwarren.db-wal\nwarren.db-shm\n";

/// Execute `wrn init`. Creates the project skeleton:
///
/// ```text
/// .warren/
///   warren.db       (SQLite store, migrated to the latest schema)
///   config.toml     (default project config template)
///   .gitignore      (the store and its WAL side files)
/// ```
///
/// # Errors
///
/// Returns an error if `.warren/` already exists and `--force` is not
/// set, or if any filesystem or database operation fails.
pub fn run_init(args: &InitArgs, project_root: &Path) -> Result<()> {
    let warren_dir = project_root.join(".warren");

    if warren_dir.exists() && !args.force {
        anyhow::bail!(".warren/ already exists. Use `wrn init --force` to reinitialize.");
    }

    std::fs::create_dir_all(&warren_dir)
        .with_context(|| format!("Failed to create directory: {}", warren_dir.display()))?;

    // Creating the store also runs migrations.
    let store_path = warren_dir.join(STORE_FILE);
    drop(db::open_store(&store_path)?);

    let config_path = warren_dir.join("config.toml");
    std::fs::write(&config_path, CONFIG_TOML)
        .with_context(|| format!("Failed to write config: {}", config_path.display()))?;

    let gitignore_path = warren_dir.join(".gitignore");
    std::fs::write(&gitignore_path, GITIGNORE)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    println!("✓ Initialized .warren/ project structure.");
    println!();
    println!("  Store:  .warren/{STORE_FILE}");
    println!("  Config: .warren/config.toml");
    println!();
    println!("Next steps:");
    println!("  Set your user identity (required for mutations):");
    println!("    export WARREN_USER=your-name");
    println!();
    println!("  Create your first community and post:");
    println!("    wrn community create rustdev");
    println!("    wrn post create rustdev --title \"Hello warren\" --body \"First post\"");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use warren_core::db::migrations;

    #[test]
    fn fresh_init_creates_structure() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, dir.path()).expect("init should succeed");

        assert!(dir.path().join(".warren").is_dir());
        assert!(dir.path().join(".warren/warren.db").is_file());
        assert!(dir.path().join(".warren/config.toml").is_file());
        assert!(dir.path().join(".warren/.gitignore").is_file());
    }

    #[test]
    fn init_migrates_store_to_latest() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, dir.path()).expect("init should succeed");

        let conn = rusqlite::Connection::open(dir.path().join(".warren/warren.db"))
            .expect("open store");
        let version = migrations::current_schema_version(&conn).expect("version");
        assert_eq!(version, migrations::LATEST_SCHEMA_VERSION);
    }

    #[test]
    fn reinit_without_force_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, dir.path()).expect("first init");

        assert!(run_init(&InitArgs { force: false }, dir.path()).is_err());
        assert!(run_init(&InitArgs { force: true }, dir.path()).is_ok());
    }

    #[test]
    fn config_template_parses_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, dir.path()).expect("init");

        let config =
            warren_core::config::load_project_config(dir.path()).expect("config parses");
        assert_eq!(config.thread.page_size, 50);
        assert_eq!(config.summary.comment_delta, 3);
        assert!(config.summary.endpoint.is_none());
    }

    #[test]
    fn gitignore_covers_store_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        run_init(&InitArgs { force: false }, dir.path()).expect("init");

        let content =
            std::fs::read_to_string(dir.path().join(".warren/.gitignore")).expect("read");
        assert!(content.contains("warren.db"));
        assert!(content.contains("warren.db-wal"));
    }
}
