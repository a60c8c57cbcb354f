// SPDX-License-Identifier: MPL-2.0

/// SQL schema for the per-user cache database.
pub const SCHEMA: &str = r#"
-- Database version for migrations
PRAGMA user_version = 1;

-- media: downloaded memory photos, keyed by public URL
CREATE TABLE IF NOT EXISTS media (
    url TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    content_type TEXT,
    size INTEGER NOT NULL,
    fetched_at INTEGER NOT NULL,
    last_accessed_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_media_last_accessed ON media(last_accessed_at);
"#;
