//! Database schema and migrations for filenest.
//!
//! Migrations are applied sequentially when the database is first opened
//! or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 hash
    created_at  TEXT NOT NULL
);
"#,
    // v2: per-user folder tree
    r#"
CREATE TABLE folders (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    parent_id   INTEGER REFERENCES folders(id),  -- NULL for root-level folders
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_folders_user_parent ON folders(user_id, parent_id);
"#,
    // v3: file metadata (content lives in the blob store)
    r#"
CREATE TABLE files (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    folder_id   INTEGER REFERENCES folders(id),  -- NULL for root-level files
    name        TEXT NOT NULL,
    size        INTEGER NOT NULL,                 -- bytes
    path        TEXT NOT NULL,                    -- logical path inside the blob store
    blob_url    TEXT NOT NULL,
    blob_ref    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_files_user_folder ON files(user_id, folder_id);
"#,
    // v4: login sessions
    r#"
CREATE TABLE sessions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    token_hash  TEXT NOT NULL UNIQUE,             -- SHA-256 hex of the cookie token
    user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    expires_at  INTEGER NOT NULL,                 -- unix seconds
    created_at  TEXT NOT NULL
);

CREATE INDEX idx_sessions_expires_at ON sessions(expires_at);
"#,
];
