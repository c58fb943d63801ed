//! SQL schema for the Muse SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per user; written whole on every update (last write wins).
CREATE TABLE IF NOT EXISTS profiles (
    user_id         TEXT PRIMARY KEY,
    email           TEXT NOT NULL,
    display_name    TEXT NOT NULL,
    avatar_url      TEXT,
    role            TEXT NOT NULL,   -- 'creator' | 'consumer' | 'admin'
    interests       TEXT NOT NULL DEFAULT '[]',
    niche           TEXT,
    target_audience TEXT,
    theme           TEXT NOT NULL,   -- 'light' | 'dark'
    created_at      TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at      TEXT NOT NULL
);

-- Local email/password accounts.
CREATE TABLE IF NOT EXISTS accounts (
    user_id       TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE,   -- trimmed, lowercased
    password_hash TEXT NOT NULL,          -- argon2 PHC string
    display_name  TEXT,
    disabled      INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- The signed-in account, if any. At most one row.
CREATE TABLE IF NOT EXISTS current_credential (
    slot         INTEGER PRIMARY KEY CHECK (slot = 1),
    user_id      TEXT NOT NULL REFERENCES accounts(user_id),
    signed_in_at TEXT NOT NULL
);

PRAGMA user_version = 1;
";
