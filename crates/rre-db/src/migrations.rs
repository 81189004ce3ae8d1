use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS registrations (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            company_name        TEXT NOT NULL,
            company_size        TEXT NOT NULL,
            address             TEXT NOT NULL,
            representative_name TEXT NOT NULL,
            position            TEXT NOT NULL,
            email               TEXT NOT NULL UNIQUE,
            phone               TEXT NOT NULL,
            selected_event      TEXT NOT NULL,
            additional_info     TEXT NOT NULL DEFAULT '',
            accept_terms        INTEGER NOT NULL DEFAULT 0,
            is_validated        INTEGER NOT NULL DEFAULT 0,
            validated_at        TEXT,
            user_password       TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS registration_activities (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            registration_id     INTEGER NOT NULL
                                REFERENCES registrations(id) ON DELETE CASCADE,
            activity_id         TEXT NOT NULL,
            activity_label      TEXT NOT NULL,
            activity_category   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_registration_activities_registration
            ON registration_activities(registration_id);

        CREATE TABLE IF NOT EXISTS wall_posts (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            registration_id INTEGER NOT NULL REFERENCES registrations(id),
            content         TEXT NOT NULL DEFAULT '',
            is_deleted      INTEGER NOT NULL DEFAULT 0,
            deleted_at      TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS wall_post_images (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id     INTEGER NOT NULL
                        REFERENCES wall_posts(id) ON DELETE CASCADE,
            name        TEXT NOT NULL,
            url         TEXT NOT NULL,
            size        INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS wall_post_documents (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id     INTEGER NOT NULL
                        REFERENCES wall_posts(id) ON DELETE CASCADE,
            name        TEXT NOT NULL,
            url         TEXT NOT NULL,
            size        INTEGER NOT NULL DEFAULT 0,
            mime_type   TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Likes and comments deliberately do not cascade from the post:
        -- a soft-deleted post keeps its children on record.
        CREATE TABLE IF NOT EXISTS wall_post_likes (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id         INTEGER NOT NULL REFERENCES wall_posts(id),
            registration_id INTEGER NOT NULL REFERENCES registrations(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(post_id, registration_id)
        );

        CREATE TABLE IF NOT EXISTS wall_comments (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            post_id         INTEGER NOT NULL REFERENCES wall_posts(id),
            registration_id INTEGER NOT NULL REFERENCES registrations(id),
            content         TEXT NOT NULL,
            is_deleted      INTEGER NOT NULL DEFAULT 0,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_wall_comments_post
            ON wall_comments(post_id, created_at);

        CREATE TABLE IF NOT EXISTS wall_comment_likes (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            comment_id      INTEGER NOT NULL REFERENCES wall_comments(id),
            registration_id INTEGER NOT NULL REFERENCES registrations(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(comment_id, registration_id)
        );

        CREATE TABLE IF NOT EXISTS chats (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            name            TEXT,
            chat_type       TEXT NOT NULL DEFAULT 'direct',
            last_message_id INTEGER REFERENCES chat_messages(id),
            created_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS chat_participants (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id         INTEGER NOT NULL
                            REFERENCES chats(id) ON DELETE CASCADE,
            registration_id INTEGER NOT NULL REFERENCES registrations(id),
            UNIQUE(chat_id, registration_id)
        );

        CREATE TABLE IF NOT EXISTS chat_messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            chat_id     INTEGER NOT NULL REFERENCES chats(id),
            sender_id   INTEGER NOT NULL REFERENCES registrations(id),
            content     TEXT NOT NULL,
            is_admin    INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_chat_messages_chat
            ON chat_messages(chat_id, created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
