//! Input validation for CLI arguments.
//!
//! Validation happens before any store access so bad input never reaches
//! SQLite. Rules are deliberately small: ids are positive integers,
//! community names are URL-safe slugs, and free text must be non-empty
//! with no control characters beyond whitespace.

use warren_core::error::ErrorCode;

/// Maximum length of a post title.
pub const MAX_TITLE_LEN: usize = 300;

/// Maximum length of a community name.
pub const MAX_COMMUNITY_NAME_LEN: usize = 32;

/// A rejected input, paired with the stable code the CLI reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub code: ErrorCode,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Parse a post/comment id: a positive base-10 integer.
pub fn parse_id(raw: &str) -> Result<i64, ValidationError> {
    let trimmed = raw.trim();
    match trimmed.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError {
            message: format!("invalid id '{raw}': expected a positive integer"),
            code: ErrorCode::InvalidId,
        }),
    }
}

/// Validate a community name: 3-32 chars of `[a-z0-9_-]`, starting with a
/// letter or digit.
pub fn validate_community_name(name: &str) -> Result<(), ValidationError> {
    let ok_len = (3..=MAX_COMMUNITY_NAME_LEN).contains(&name.len());
    let ok_chars = name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
    let ok_start = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

    if ok_len && ok_chars && ok_start {
        Ok(())
    } else {
        Err(ValidationError {
            message: format!(
                "invalid community name '{name}': use 3-{MAX_COMMUNITY_NAME_LEN} lowercase \
                 letters, digits, '-' or '_', starting with a letter or digit"
            ),
            code: ErrorCode::InvalidEnumValue,
        })
    }
}

/// Validate a post title: non-empty after trimming, bounded length, single
/// line.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError {
            message: "title must not be empty".to_string(),
            code: ErrorCode::InvalidEnumValue,
        });
    }
    if trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError {
            message: format!("title exceeds {MAX_TITLE_LEN} characters"),
            code: ErrorCode::InvalidEnumValue,
        });
    }
    if trimmed.chars().any(|c| c == '\n' || c == '\r') {
        return Err(ValidationError {
            message: "title must be a single line".to_string(),
            code: ErrorCode::InvalidEnumValue,
        });
    }
    Ok(())
}

/// Validate free-form body text: non-empty after trimming, no control
/// characters except newline and tab.
pub fn validate_body(body: &str) -> Result<(), ValidationError> {
    if body.trim().is_empty() {
        return Err(ValidationError {
            message: "body must not be empty".to_string(),
            code: ErrorCode::InvalidEnumValue,
        });
    }
    if body
        .chars()
        .any(|c| c.is_control() && c != '\n' && c != '\t')
    {
        return Err(ValidationError {
            message: "body contains control characters".to_string(),
            code: ErrorCode::InvalidEnumValue,
        });
    }
    Ok(())
}
