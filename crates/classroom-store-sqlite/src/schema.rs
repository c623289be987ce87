//! SQL schema for the classroom SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `user_version` pragma.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id         TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL,
    role            TEXT NOT NULL,   -- 'super_admin'|'admin'|'group_admin'|'student'
    mode            TEXT,            -- 'online' | 'offline' | NULL
    is_approved     INTEGER NOT NULL DEFAULT 1,
    assigned_groups TEXT NOT NULL DEFAULT '[]',  -- JSON array of group ids
    preferences     TEXT NOT NULL DEFAULT '{\"emailNotifications\":true,\"announcementEmails\":true}',
    created_at      TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS groups (
    group_id    TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_by  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Notifications are write-once.
-- Only status and read_by are ever updated; read_by only grows.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    content         TEXT NOT NULL,
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    recipient_type  TEXT NOT NULL,   -- discriminant of the Recipients variant
    recipients_json TEXT NOT NULL,   -- JSON payload (inner data only)
    status          TEXT NOT NULL DEFAULT 'sent',
    read_by         TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS announcements (
    announcement_id TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    content         TEXT NOT NULL,
    group_ids       TEXT NOT NULL DEFAULT '[]',
    created_by      TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    priority        INTEGER NOT NULL DEFAULT 0,
    view_count      INTEGER NOT NULL DEFAULT 0,
    viewed_by       TEXT NOT NULL DEFAULT '[]'
);

CREATE INDEX IF NOT EXISTS users_role_idx             ON users(role);
CREATE INDEX IF NOT EXISTS users_mode_idx             ON users(mode);
CREATE INDEX IF NOT EXISTS notifications_created_idx  ON notifications(created_at);
CREATE INDEX IF NOT EXISTS announcements_created_idx  ON announcements(created_at);

PRAGMA user_version = 1;
";
