use std::fmt;

/// Machine-readable error codes surfaced by the CLI and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidId,
    CommunityNotFound,
    PostNotFound,
    CommentNotFound,
    ParentNotFound,
    CrossPostParent,
    InvalidEnumValue,
    DuplicateCommunity,
    AggregationFailed,
    CorruptStore,
    SummaryUnavailable,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidId => "E2001",
            Self::CommunityNotFound => "E2002",
            Self::PostNotFound => "E2003",
            Self::CommentNotFound => "E2004",
            Self::ParentNotFound => "E2005",
            Self::CrossPostParent => "E2006",
            Self::InvalidEnumValue => "E2007",
            Self::DuplicateCommunity => "E2008",
            Self::AggregationFailed => "E3001",
            Self::CorruptStore => "E3002",
            Self::SummaryUnavailable => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidId => "Invalid numeric identifier",
            Self::CommunityNotFound => "Community not found",
            Self::PostNotFound => "Post not found",
            Self::CommentNotFound => "Comment not found",
            Self::ParentNotFound => "Parent comment not found",
            Self::CrossPostParent => "Parent comment belongs to a different post",
            Self::InvalidEnumValue => "Invalid kind/target/direction value",
            Self::DuplicateCommunity => "Community name already taken",
            Self::AggregationFailed => "Vote aggregation failed",
            Self::CorruptStore => "Corrupt SQLite store",
            Self::SummaryUnavailable => "Summary service unavailable",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `wrn init` to initialize this directory."),
            Self::ConfigParseError => Some("Fix syntax in .warren/config.toml and retry."),
            Self::InvalidId => Some("Post and comment ids are positive integers."),
            Self::CommunityNotFound => Some("Check the name with `wrn community list`."),
            Self::PostNotFound => Some("Check the id with `wrn post list`."),
            Self::CommentNotFound => None,
            Self::ParentNotFound => Some("Check the parent id with `wrn thread <post-id>`."),
            Self::CrossPostParent => {
                Some("Replies must target a comment on the same post.")
            }
            Self::InvalidEnumValue => Some("Use one of the documented kind/target values."),
            Self::DuplicateCommunity => Some("Pick a different community name."),
            Self::AggregationFailed => Some("Retry once. If persistent, check the store file."),
            Self::CorruptStore => Some("Restore .warren/warren.db from backup or re-init."),
            Self::SummaryUnavailable => {
                Some("Configure [summary].endpoint or retry later; posts still work.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
