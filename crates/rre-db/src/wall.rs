use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use rre_types::api::MediaRef;
use rre_types::models::{Comment, PostMedia, WallPost};

use crate::models::parse_datetime;
use crate::{Database, OptionalExt};

struct PostRow {
    id: i64,
    author_id: i64,
    author_name: String,
    author_email: String,
    content: String,
    is_deleted: bool,
    likes_count: i64,
    comments_count: i64,
    created_at: String,
    updated_at: String,
}

const POST_SELECT: &str = "SELECT p.id, p.registration_id,
            COALESCE(r.company_name, 'unknown'),
            COALESCE(r.email, ''),
            p.content, p.is_deleted, p.created_at, p.updated_at,
            COUNT(DISTINCT pl.id) AS likes_count,
            COUNT(DISTINCT pc.id) AS comments_count
     FROM wall_posts p
     LEFT JOIN registrations r ON p.registration_id = r.id
     LEFT JOIN wall_post_likes pl ON pl.post_id = p.id
     LEFT JOIN wall_comments pc ON pc.post_id = p.id AND pc.is_deleted = 0";

impl Database {
    /// Non-deleted posts with author, counts and media, newest first.
    pub fn list_posts(&self) -> Result<Vec<WallPost>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{POST_SELECT}
                 WHERE p.is_deleted = 0
                 GROUP BY p.id
                 ORDER BY p.created_at DESC, p.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_post_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            assemble_posts(conn, rows)
        })
    }

    /// Direct id lookup; soft-deleted posts are still reachable here,
    /// attachments included.
    pub fn get_post(&self, id: i64) -> Result<Option<WallPost>> {
        self.with_conn(|conn| {
            let sql = format!("{POST_SELECT} WHERE p.id = ?1 GROUP BY p.id");
            let mut stmt = conn.prepare(&sql)?;
            let Some(row) = stmt.query_row([id], map_post_row).optional()? else {
                return Ok(None);
            };
            Ok(assemble_posts(conn, vec![row])?.pop())
        })
    }

    /// Insert a post and one row per attachment. Deliberately not a
    /// transaction: a crash mid-sequence leaves a post without its media.
    pub fn create_post(
        &self,
        author_id: i64,
        content: &str,
        images: &[MediaRef],
        documents: &[MediaRef],
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO wall_posts (registration_id, content) VALUES (?1, ?2)",
                rusqlite::params![author_id, content],
            )?;
            let post_id = conn.last_insert_rowid();

            for image in images {
                conn.execute(
                    "INSERT INTO wall_post_images (post_id, name, url, size)
                     VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![post_id, image.name, image.url, image.size],
                )?;
            }
            for document in documents {
                conn.execute(
                    "INSERT INTO wall_post_documents (post_id, name, url, size, mime_type)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    rusqlite::params![
                        post_id,
                        document.name,
                        document.url,
                        document.size,
                        document.mime_type,
                    ],
                )?;
            }

            Ok(post_id)
        })
    }

    /// (owner id, soft-deleted flag), or None for an unknown post.
    pub fn post_owner(&self, id: i64) -> Result<Option<(i64, bool)>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT registration_id, is_deleted FROM wall_posts WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
        })
    }

    pub fn update_post(&self, id: i64, content: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE wall_posts
                 SET content = ?1, updated_at = datetime('now')
                 WHERE id = ?2",
                rusqlite::params![content, id],
            )?;
            Ok(())
        })
    }

    /// Soft delete: the row, its attachments, comments and likes all stay
    /// in storage.
    pub fn soft_delete_post(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE wall_posts
                 SET is_deleted = 1, deleted_at = datetime('now')
                 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    /// Toggle a post like: removes if present, inserts if not.
    /// Returns true when the like now exists.
    pub fn toggle_post_like(&self, post_id: i64, user_id: i64) -> Result<bool> {
        self.toggle_like("wall_post_likes", "post_id", post_id, user_id)
    }

    pub fn toggle_comment_like(&self, comment_id: i64, user_id: i64) -> Result<bool> {
        self.toggle_like("wall_comment_likes", "comment_id", comment_id, user_id)
    }

    fn toggle_like(
        &self,
        table: &str,
        target_column: &str,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    &format!(
                        "SELECT id FROM {table}
                         WHERE {target_column} = ?1 AND registration_id = ?2"
                    ),
                    rusqlite::params![target_id, user_id],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(like_id) = existing {
                conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [like_id])?;
                Ok(false)
            } else {
                conn.execute(
                    &format!(
                        "INSERT INTO {table} ({target_column}, registration_id)
                         VALUES (?1, ?2)"
                    ),
                    rusqlite::params![target_id, user_id],
                )?;
                Ok(true)
            }
        })
    }

    pub fn post_liked(&self, post_id: i64, user_id: i64) -> Result<bool> {
        self.liked("wall_post_likes", "post_id", post_id, user_id)
    }

    pub fn comment_liked(&self, comment_id: i64, user_id: i64) -> Result<bool> {
        self.liked("wall_comment_likes", "comment_id", comment_id, user_id)
    }

    fn liked(
        &self,
        table: &str,
        target_column: &str,
        target_id: i64,
        user_id: i64,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM {table}
                     WHERE {target_column} = ?1 AND registration_id = ?2"
                ),
                rusqlite::params![target_id, user_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    /// Non-deleted comments of one post, oldest first.
    pub fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.registration_id,
                        COALESCE(r.company_name, 'unknown'),
                        c.content, c.created_at, c.updated_at,
                        COUNT(DISTINCT cl.id) AS likes_count
                 FROM wall_comments c
                 LEFT JOIN registrations r ON c.registration_id = r.id
                 LEFT JOIN wall_comment_likes cl ON cl.comment_id = c.id
                 WHERE c.post_id = ?1 AND c.is_deleted = 0
                 GROUP BY c.id
                 ORDER BY c.created_at ASC, c.id ASC",
            )?;
            let rows = stmt
                .query_map([post_id], map_comment_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn add_comment(&self, post_id: i64, user_id: i64, content: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO wall_comments (post_id, registration_id, content)
                 VALUES (?1, ?2, ?3)",
                rusqlite::params![post_id, user_id, content],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.registration_id,
                        COALESCE(r.company_name, 'unknown'),
                        c.content, c.created_at, c.updated_at,
                        COUNT(DISTINCT cl.id) AS likes_count
                 FROM wall_comments c
                 LEFT JOIN registrations r ON c.registration_id = r.id
                 LEFT JOIN wall_comment_likes cl ON cl.comment_id = c.id
                 WHERE c.id = ?1
                 GROUP BY c.id",
            )?;
            stmt.query_row([id], map_comment_row).optional()
        })
    }

    pub fn comment_owner(&self, id: i64) -> Result<Option<(i64, bool)>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT registration_id, is_deleted FROM wall_comments WHERE id = ?1",
                [id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
        })
    }

    pub fn update_comment(&self, id: i64, content: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE wall_comments
                 SET content = ?1, updated_at = datetime('now')
                 WHERE id = ?2",
                rusqlite::params![content, id],
            )?;
            Ok(())
        })
    }

    pub fn soft_delete_comment(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE wall_comments SET is_deleted = 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }
}

fn map_post_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        author_email: row.get(3)?,
        content: row.get(4)?,
        is_deleted: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        likes_count: row.get(8)?,
        comments_count: row.get(9)?,
    })
}

fn map_comment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_name: row.get(3)?,
        content: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?),
        updated_at: parse_datetime(&row.get::<_, String>(6)?),
        likes_count: row.get(7)?,
    })
}

fn assemble_posts(conn: &Connection, rows: Vec<PostRow>) -> Result<Vec<WallPost>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut images = query_media(conn, "wall_post_images", false, &ids)?;
    let mut documents = query_media(conn, "wall_post_documents", true, &ids)?;

    Ok(rows
        .into_iter()
        .map(|row| WallPost {
            id: row.id,
            author_id: row.author_id,
            author_name: row.author_name,
            author_email: row.author_email,
            content: row.content,
            is_deleted: row.is_deleted,
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            images: images.remove(&row.id).unwrap_or_default(),
            documents: documents.remove(&row.id).unwrap_or_default(),
            created_at: parse_datetime(&row.created_at),
            updated_at: parse_datetime(&row.updated_at),
        })
        .collect())
}

/// Batch-fetch attachments for a set of posts, in insertion order.
fn query_media(
    conn: &Connection,
    table: &str,
    with_mime: bool,
    post_ids: &[i64],
) -> Result<HashMap<i64, Vec<PostMedia>>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=post_ids.len()).map(|i| format!("?{}", i)).collect();
    let mime_column = if with_mime { "mime_type" } else { "NULL" };
    let sql = format!(
        "SELECT post_id, id, name, url, size, {mime_column} FROM {table}
         WHERE post_id IN ({})
         ORDER BY post_id, id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = post_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut grouped: HashMap<i64, Vec<PostMedia>> = HashMap::new();
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            PostMedia {
                id: row.get(1)?,
                name: row.get(2)?,
                url: row.get(3)?,
                size: row.get(4)?,
                mime_type: row.get(5)?,
            },
        ))
    })?;
    for row in rows {
        let (post_id, media) = row?;
        grouped.entry(post_id).or_default().push(media);
    }

    Ok(grouped)
}
