//! User identity resolution for CLI commands.
//!
//! The resolution chain: `--user` flag > `WARREN_USER` env > `USER` env
//! (TTY only). Mutating commands require an identity; read-only commands
//! work without one and render the anonymous view.

use std::env;

/// Errors from user identity resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserResolutionError {
    /// Human-readable description.
    pub message: String,
    /// Machine error code.
    pub code: &'static str,
}

impl std::fmt::Display for UserResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UserResolutionError {}

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

/// Core resolution logic, parameterized by environment reader.
fn resolve_user_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    // Step 1: explicit --user flag
    if let Some(user) = cli_flag {
        if !user.is_empty() {
            return Some(user.to_string());
        }
    }

    // Step 2: WARREN_USER env
    if let Some(val) = env.get("WARREN_USER") {
        return Some(val);
    }

    // Step 3: USER env, but only if stdin is a TTY
    if env.is_tty() {
        if let Some(val) = env.get("USER") {
            return Some(val);
        }
    }

    None
}

/// Resolve the user identity following the 3-step chain:
///
/// 1. `--user` CLI flag (passed as `cli_flag`)
/// 2. `WARREN_USER` environment variable
/// 3. `USER` environment variable (only if running in a TTY)
///
/// Returns `None` if no identity could be resolved.
pub fn resolve_user(cli_flag: Option<&str>) -> Option<String> {
    resolve_user_with(cli_flag, &RealEnv)
}

/// Resolve the user identity, returning an error if not found.
///
/// Use this for mutating commands that require a user.
pub fn require_user(cli_flag: Option<&str>) -> Result<String, UserResolutionError> {
    resolve_user(cli_flag).ok_or_else(|| UserResolutionError {
        message: "User identity required for this command. \
                  Set --user or the WARREN_USER environment variable."
            .to_string(),
        code: "missing_user",
    })
}
