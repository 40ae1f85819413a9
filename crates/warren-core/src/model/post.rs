use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// The three kinds of post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Text,
    Link,
    Poll,
}

impl PostKind {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Link => "link",
            Self::Poll => "poll",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for PostKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "link" => Ok(Self::Link),
            "poll" => Ok(Self::Poll),
            _ => Err(ParseEnumError {
                expected: "post kind",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PostKind;
    use std::str::FromStr;

    #[test]
    fn enum_json_roundtrips() {
        assert_eq!(serde_json::to_string(&PostKind::Text).unwrap(), "\"text\"");
        assert_eq!(serde_json::to_string(&PostKind::Poll).unwrap(), "\"poll\"");
        assert_eq!(
            serde_json::from_str::<PostKind>("\"link\"").unwrap(),
            PostKind::Link
        );
    }

    #[test]
    fn display_parse_roundtrips() {
        for value in [PostKind::Text, PostKind::Link, PostKind::Poll] {
            let rendered = value.to_string();
            let reparsed = PostKind::from_str(&rendered).unwrap();
            assert_eq!(value, reparsed);
        }
    }

    #[test]
    fn parse_rejects_unknown_values() {
        assert!(PostKind::from_str("image").is_err());
        assert!(PostKind::from_str("").is_err());
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        assert_eq!(PostKind::from_str(" TEXT ").unwrap(), PostKind::Text);
    }
}
