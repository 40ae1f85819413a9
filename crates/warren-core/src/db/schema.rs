//! Canonical SQLite schema for the warren store.
//!
//! The schema is normalized for queryability:
//! - `communities` and `posts` keep the aggregate fields for each entity,
//!   including the AI-summary metadata triple on `posts`
//! - `comments` is an adjacency list (`parent_comment_id`) flattened per
//!   post; the nested forest is rebuilt in memory at read time
//! - `votes` holds one row per `(user, target)` pair so re-voting is an
//!   upsert, never an append
//! - edge tables (`follows`, `saved_posts`, `poll_ballots`) model
//!   multi-valued relationships
//! - `store_meta` tracks the schema version

/// Migration v1: core normalized tables plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS communities (
    community_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE CHECK (length(trim(name)) > 0),
    description TEXT,
    created_by TEXT NOT NULL,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS posts (
    post_id INTEGER PRIMARY KEY AUTOINCREMENT,
    community_id INTEGER NOT NULL REFERENCES communities(community_id) ON DELETE CASCADE,
    author TEXT NOT NULL,
    title TEXT NOT NULL CHECK (length(trim(title)) > 0),
    kind TEXT NOT NULL CHECK (kind IN ('text', 'link', 'poll')),
    body TEXT,
    url TEXT,
    ai_summary TEXT,
    ai_summary_generated_at_us INTEGER,
    ai_summary_comment_count INTEGER NOT NULL DEFAULT 0,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS poll_options (
    option_id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    label TEXT NOT NULL CHECK (length(trim(label)) > 0),
    position INTEGER NOT NULL,
    UNIQUE (post_id, position)
);

CREATE TABLE IF NOT EXISTS poll_ballots (
    post_id INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    option_id INTEGER NOT NULL REFERENCES poll_options(option_id) ON DELETE CASCADE,
    user_id TEXT NOT NULL,
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (post_id, user_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    post_id INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    parent_comment_id INTEGER REFERENCES comments(comment_id) ON DELETE CASCADE,
    author TEXT NOT NULL,
    body TEXT NOT NULL CHECK (length(trim(body)) > 0),
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS votes (
    user_id TEXT NOT NULL,
    target_type TEXT NOT NULL CHECK (target_type IN ('post', 'comment')),
    target_id INTEGER NOT NULL,
    value INTEGER NOT NULL CHECK (value IN (-1, 1)),
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (user_id, target_type, target_id)
);

CREATE TABLE IF NOT EXISTS follows (
    user_id TEXT NOT NULL,
    community_id INTEGER NOT NULL REFERENCES communities(community_id) ON DELETE CASCADE,
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (user_id, community_id)
);

CREATE TABLE IF NOT EXISTS saved_posts (
    user_id TEXT NOT NULL,
    post_id INTEGER NOT NULL REFERENCES posts(post_id) ON DELETE CASCADE,
    created_at_us INTEGER NOT NULL,
    PRIMARY KEY (user_id, post_id)
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL
);

INSERT OR IGNORE INTO store_meta (id, schema_version) VALUES (1, 1);
";

/// Migration v2: read-path indexes for the thread and listing queries.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_posts_community_created
    ON posts(community_id, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_comments_post_toplevel
    ON comments(post_id, created_at_us DESC)
    WHERE parent_comment_id IS NULL;

CREATE INDEX IF NOT EXISTS idx_comments_parent_created
    ON comments(parent_comment_id, created_at_us DESC);

CREATE INDEX IF NOT EXISTS idx_votes_target
    ON votes(target_type, target_id);

CREATE INDEX IF NOT EXISTS idx_follows_user
    ON follows(user_id, community_id);

CREATE INDEX IF NOT EXISTS idx_saved_posts_user
    ON saved_posts(user_id, created_at_us DESC);

UPDATE store_meta
SET schema_version = 2
WHERE id = 1;
";

/// Indexes expected by the thread/listing query paths.
pub const REQUIRED_INDEXES: &[&str] = &[
    "idx_posts_community_created",
    "idx_comments_post_toplevel",
    "idx_comments_parent_created",
    "idx_votes_target",
    "idx_follows_user",
    "idx_saved_posts_user",
];
