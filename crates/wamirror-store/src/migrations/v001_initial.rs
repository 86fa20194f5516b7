//! v001 -- Initial schema creation.
//!
//! Creates the four durable tables: `chats`, `contacts`, `group_metadata`
//! and `sessions`. Message history is never persisted.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Conversations (opaque JSON summary per id)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS chats (
    id   TEXT PRIMARY KEY NOT NULL,           -- conversation JID
    data TEXT NOT NULL                        -- serialized summary
);

-- ----------------------------------------------------------------
-- Contacts
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS contacts (
    id            TEXT PRIMARY KEY NOT NULL,  -- contact JID
    lid           TEXT,
    phone_number  TEXT,
    name          TEXT,
    notify        TEXT,
    verified_name TEXT,
    img_url       TEXT,
    status        TEXT
);

CREATE INDEX IF NOT EXISTS idx_contacts_lid ON contacts(lid);

-- ----------------------------------------------------------------
-- Group metadata
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS group_metadata (
    id                    TEXT PRIMARY KEY NOT NULL,  -- group JID
    subject               TEXT NOT NULL,
    subject_owner         TEXT,
    subject_time          INTEGER,
    owner                 TEXT,
    creation              INTEGER,
    descr                 TEXT,
    desc_owner            TEXT,
    desc_id               TEXT,
    desc_time             REAL,
    linked_parent         TEXT,
    restrict_info         INTEGER,                    -- boolean 0/1
    announce              INTEGER,                    -- boolean 0/1
    member_add_mode       INTEGER,                    -- boolean 0/1
    join_approval_mode    INTEGER,                    -- boolean 0/1
    is_community          INTEGER,                    -- boolean 0/1
    is_community_announce INTEGER,                    -- boolean 0/1
    size                  INTEGER,
    participants          TEXT NOT NULL DEFAULT '[]', -- JSON roster, ordered
    ephemeral_duration    INTEGER,
    invite_code           TEXT,
    addressing_mode       TEXT,
    author                TEXT,
    expired_at            INTEGER                     -- epoch seconds
);

-- ----------------------------------------------------------------
-- Session blobs (auth state, keyed by sanitized name)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    name TEXT PRIMARY KEY NOT NULL,
    data TEXT NOT NULL
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
