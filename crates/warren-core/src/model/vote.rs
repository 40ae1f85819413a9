use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::post::ParseEnumError;

/// What a vote is attached to. A target is identified by
/// `(TargetType, target_id)`; post and comment ids live in separate
/// keyspaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

impl TargetType {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "post" => Ok(Self::Post),
            "comment" => Ok(Self::Comment),
            _ => Err(ParseEnumError {
                expected: "vote target",
                got: s.to_string(),
            }),
        }
    }
}

/// A single vote's direction. Stored as -1 / +1; a user has at most one
/// vote per target and re-voting overwrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum VoteValue {
    Down,
    Up,
}

impl VoteValue {
    #[must_use]
    pub const fn as_i8(self) -> i8 {
        match self {
            Self::Down => -1,
            Self::Up => 1,
        }
    }
}

impl From<VoteValue> for i8 {
    fn from(value: VoteValue) -> Self {
        value.as_i8()
    }
}

impl TryFrom<i8> for VoteValue {
    type Error = ParseEnumError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Down),
            1 => Ok(Self::Up),
            other => Err(ParseEnumError {
                expected: "vote value",
                got: other.to_string(),
            }),
        }
    }
}

impl FromStr for VoteValue {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "+1" | "1" => Ok(Self::Up),
            "down" | "-1" => Ok(Self::Down),
            _ => Err(ParseEnumError {
                expected: "vote direction",
                got: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => f.write_str("down"),
            Self::Up => f.write_str("up"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TargetType, VoteValue};
    use std::str::FromStr;

    #[test]
    fn vote_value_json_is_numeric() {
        assert_eq!(serde_json::to_string(&VoteValue::Up).unwrap(), "1");
        assert_eq!(serde_json::to_string(&VoteValue::Down).unwrap(), "-1");
        assert_eq!(
            serde_json::from_str::<VoteValue>("-1").unwrap(),
            VoteValue::Down
        );
        assert!(serde_json::from_str::<VoteValue>("0").is_err());
        assert!(serde_json::from_str::<VoteValue>("2").is_err());
    }

    #[test]
    fn vote_value_parse_aliases() {
        assert_eq!(VoteValue::from_str("up").unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::from_str("+1").unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::from_str("down").unwrap(), VoteValue::Down);
        assert_eq!(VoteValue::from_str("-1").unwrap(), VoteValue::Down);
        assert!(VoteValue::from_str("sideways").is_err());
    }

    #[test]
    fn target_type_roundtrips() {
        for value in [TargetType::Post, TargetType::Comment] {
            let rendered = value.to_string();
            assert_eq!(TargetType::from_str(&rendered).unwrap(), value);
        }
        assert!(TargetType::from_str("community").is_err());
    }
}
