//! Database schema and migrations for studyhall.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Users table
    r#"
-- Users table for authentication and account management.
-- All timestamps are integer milliseconds since the Unix epoch.
CREATE TABLE users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL,
    password_salt TEXT NOT NULL,           -- verifier-specific, opaque
    password_hash TEXT NOT NULL,           -- verifier-specific, opaque
    role          TEXT NOT NULL DEFAULT 'student',  -- 'student', 'teacher'
    version       INTEGER NOT NULL DEFAULT 0,       -- bumped on every password change
    is_disabled   INTEGER NOT NULL DEFAULT 0,
    is_deleted    INTEGER NOT NULL DEFAULT 0,
    created_at    INTEGER NOT NULL,
    nickname      TEXT,
    avatar_url    TEXT,
    bio           TEXT
);

-- Uniqueness holds over live rows only; soft-deleted usernames may be reused.
CREATE UNIQUE INDEX idx_users_username_live ON users(username) WHERE is_deleted = 0;
CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: Exercises table
    r#"
CREATE TABLE exercises (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    creator_id  INTEGER NOT NULL REFERENCES users(id),
    media       TEXT NOT NULL DEFAULT '[]',  -- JSON array of {type, url}
    published   INTEGER NOT NULL DEFAULT 0,
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);

CREATE INDEX idx_exercises_creator_id ON exercises(creator_id);
CREATE INDEX idx_exercises_is_deleted ON exercises(is_deleted);
"#,
    // v3: Solutions table
    r#"
CREATE TABLE solutions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    exercise_id INTEGER NOT NULL REFERENCES exercises(id),
    creator_id  INTEGER NOT NULL REFERENCES users(id),
    content     TEXT NOT NULL,
    language    TEXT NOT NULL,
    image_urls  TEXT NOT NULL DEFAULT '[]',  -- JSON array of strings
    status      TEXT NOT NULL DEFAULT 'pending',
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL
);

CREATE INDEX idx_solutions_exercise_id ON solutions(exercise_id);
CREATE INDEX idx_solutions_creator_id ON solutions(creator_id);
"#,
    // v4: Announcements table
    r#"
CREATE TABLE announcements (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    creator_id  INTEGER NOT NULL REFERENCES users(id),
    is_deleted  INTEGER NOT NULL DEFAULT 0,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
"#,
    // v5: Login failure history (persisted: the lockout is a security
    // control and must survive a process restart)
    r#"
CREATE TABLE login_failures (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    username   TEXT NOT NULL,
    failed_at  INTEGER NOT NULL
);

CREATE INDEX idx_login_failures_username ON login_failures(username);
"#,
];
