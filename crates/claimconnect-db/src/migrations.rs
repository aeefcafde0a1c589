use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            fullname    TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE,
            phone       TEXT NOT NULL,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS lost_items (
            id          TEXT PRIMARY KEY,
            owner_name  TEXT NOT NULL,
            item_name   TEXT NOT NULL,
            image       TEXT,
            location    TEXT NOT NULL,
            date_lost   TEXT NOT NULL,
            contact_no  TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_lost_items_date
            ON lost_items(date_lost);

        CREATE TABLE IF NOT EXISTS found_items (
            id          TEXT PRIMARY KEY,
            finder_name TEXT NOT NULL,
            item_name   TEXT NOT NULL,
            image       TEXT,
            location    TEXT NOT NULL,
            date_found  TEXT NOT NULL,
            contact_no  TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_found_items_date
            ON found_items(date_found);

        -- item_id is a non-owning reference into found_items: no FOREIGN KEY,
        -- a request may outlive the item it points at.
        CREATE TABLE IF NOT EXISTS verification_requests (
            id           TEXT PRIMARY KEY,
            item_id      TEXT NOT NULL,
            item_name    TEXT NOT NULL,
            username     TEXT NOT NULL,
            description  TEXT NOT NULL,
            invoice      TEXT,
            status       TEXT NOT NULL DEFAULT 'pending'
                         CHECK (status IN ('pending', 'accepted', 'rejected')),
            request_date TEXT NOT NULL DEFAULT (datetime('now')),
            decided_at   TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_verification_status
            ON verification_requests(status);

        CREATE TABLE IF NOT EXISTS notifications (
            id          TEXT PRIMARY KEY,
            user_email  TEXT NOT NULL,
            type        TEXT NOT NULL,
            message     TEXT NOT NULL,
            is_read     INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_notifications_user
            ON notifications(user_email, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
