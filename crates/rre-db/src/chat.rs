use std::collections::HashMap;

use anyhow::{Result, anyhow};
use rusqlite::Connection;

use rre_types::models::{ChatKind, ChatMessage, ChatParticipant, ChatSummary, ChatUser};

use crate::models::{MessageRow, parse_chat_kind, parse_datetime};
use crate::{Database, OptionalExt};

struct ChatRow {
    id: i64,
    name: Option<String>,
    chat_type: String,
    created_at: String,
    last_message: Option<MessageRow>,
}

impl Database {
    /// Insert a chat plus one participant row per member.
    pub fn create_chat(
        &self,
        name: Option<&str>,
        kind: ChatKind,
        participant_ids: &[i64],
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chats (name, chat_type) VALUES (?1, ?2)",
                rusqlite::params![name, kind.as_str()],
            )?;
            let chat_id = conn.last_insert_rowid();

            for registration_id in participant_ids {
                conn.execute(
                    "INSERT INTO chat_participants (chat_id, registration_id)
                     VALUES (?1, ?2)",
                    rusqlite::params![chat_id, registration_id],
                )?;
            }

            Ok(chat_id)
        })
    }

    /// The direct chat holding exactly this pair of participants, if one
    /// already exists. Order of the pair does not matter.
    pub fn find_direct_chat(&self, a: i64, b: i64) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT c.id FROM chats c
                 WHERE c.chat_type = 'direct'
                   AND EXISTS (SELECT 1 FROM chat_participants
                               WHERE chat_id = c.id AND registration_id = ?1)
                   AND EXISTS (SELECT 1 FROM chat_participants
                               WHERE chat_id = c.id AND registration_id = ?2)
                   AND (SELECT COUNT(*) FROM chat_participants
                        WHERE chat_id = c.id) = 2
                 ORDER BY c.id
                 LIMIT 1",
                rusqlite::params![a, b],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Validated attendees matching the query on representative name,
    /// company name or email, excluding the requester. An empty query
    /// returns everyone available to chat with.
    pub fn search_users(&self, query: &str, current_user_id: i64) -> Result<Vec<ChatUser>> {
        self.with_conn(|conn| {
            let pattern = format!("%{}%", query.trim());
            let mut stmt = conn.prepare(
                "SELECT id, representative_name, email, company_name
                 FROM registrations
                 WHERE is_validated = 1 AND id != ?1
                   AND (representative_name LIKE ?2
                        OR company_name LIKE ?2
                        OR email LIKE ?2)
                 ORDER BY representative_name ASC, id ASC",
            )?;
            let rows = stmt
                .query_map(rusqlite::params![current_user_id, pattern], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let ids: Vec<i64> = rows.iter().map(|r| r.0).collect();
            let mut labels = query_activity_labels(conn, &ids)?;

            Ok(rows
                .into_iter()
                .map(|(id, name, email, company)| ChatUser {
                    id,
                    name,
                    email,
                    company,
                    activities: labels.remove(&id).unwrap_or_default(),
                })
                .collect())
        })
    }

    pub fn chat_exists(&self, chat_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM chats WHERE id = ?1",
                [chat_id],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn get_chat(&self, chat_id: i64) -> Result<Option<ChatSummary>> {
        self.with_conn(|conn| {
            let sql = format!("{CHAT_SELECT} WHERE c.id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let Some(row) = stmt.query_row([chat_id], map_chat_row).optional()? else {
                return Ok(None);
            };
            Ok(assemble_chats(conn, vec![row])?.pop())
        })
    }

    /// Every chat the user participates in, annotated with its last message,
    /// most recently active first.
    pub fn list_chats(&self, user_id: i64) -> Result<Vec<ChatSummary>> {
        self.with_conn(|conn| {
            let sql = format!(
                "{CHAT_SELECT}
                 JOIN chat_participants cp
                   ON cp.chat_id = c.id AND cp.registration_id = ?1
                 ORDER BY COALESCE(m.created_at, c.created_at) DESC, c.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_chat_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            assemble_chats(conn, rows)
        })
    }

    /// Messages of one chat, oldest first, with sender display names.
    pub fn list_messages(&self, chat_id: i64) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.chat_id, m.sender_id,
                        COALESCE(r.representative_name, 'unknown'),
                        m.content, m.is_admin, m.created_at
                 FROM chat_messages m
                 LEFT JOIN registrations r ON m.sender_id = r.id
                 WHERE m.chat_id = ?1
                 ORDER BY m.created_at ASC, m.id ASC",
            )?;
            let rows = stmt
                .query_map([chat_id], map_message_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows.into_iter().map(MessageRow::into_message).collect())
        })
    }

    /// Insert a message and repoint the chat's denormalized last-message
    /// reference. The two statements are sequential, not transactional.
    pub fn insert_message(
        &self,
        chat_id: i64,
        sender_id: i64,
        content: &str,
        is_admin: bool,
    ) -> Result<ChatMessage> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (chat_id, sender_id, content, is_admin)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![chat_id, sender_id, content, is_admin],
            )?;
            let message_id = conn.last_insert_rowid();

            conn.execute(
                "UPDATE chats SET last_message_id = ?1 WHERE id = ?2",
                rusqlite::params![message_id, chat_id],
            )?;

            let mut stmt = conn.prepare(
                "SELECT m.id, m.chat_id, m.sender_id,
                        COALESCE(r.representative_name, 'unknown'),
                        m.content, m.is_admin, m.created_at
                 FROM chat_messages m
                 LEFT JOIN registrations r ON m.sender_id = r.id
                 WHERE m.id = ?1",
            )?;
            let row = stmt
                .query_row([message_id], map_message_row)
                .map_err(|e| anyhow!("Message vanished after insert: {e}"))?;
            Ok(row.into_message())
        })
    }
}

const CHAT_SELECT: &str = "SELECT c.id, c.name, c.chat_type, c.created_at,
            m.id, m.chat_id, m.sender_id,
            COALESCE(s.representative_name, 'unknown'),
            m.content, m.is_admin, m.created_at
     FROM chats c
     LEFT JOIN chat_messages m ON c.last_message_id = m.id
     LEFT JOIN registrations s ON m.sender_id = s.id";

fn map_chat_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatRow> {
    let last_message = match row.get::<_, Option<i64>>(4)? {
        Some(message_id) => Some(MessageRow {
            id: message_id,
            chat_id: row.get(5)?,
            sender_id: row.get(6)?,
            sender_name: row.get(7)?,
            content: row.get(8)?,
            is_admin: row.get(9)?,
            created_at: row.get(10)?,
        }),
        None => None,
    };

    Ok(ChatRow {
        id: row.get(0)?,
        name: row.get(1)?,
        chat_type: row.get(2)?,
        created_at: row.get(3)?,
        last_message,
    })
}

fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender_id: row.get(2)?,
        sender_name: row.get(3)?,
        content: row.get(4)?,
        is_admin: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn assemble_chats(conn: &Connection, rows: Vec<ChatRow>) -> Result<Vec<ChatSummary>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut participants = query_participants(conn, &ids)?;

    Ok(rows
        .into_iter()
        .map(|row| ChatSummary {
            id: row.id,
            name: row.name,
            kind: parse_chat_kind(&row.chat_type),
            participants: participants.remove(&row.id).unwrap_or_default(),
            last_message: row.last_message.map(MessageRow::into_message),
            created_at: parse_datetime(&row.created_at),
        })
        .collect())
}

/// Batch-fetch activity labels for a set of registrations.
fn query_activity_labels(
    conn: &Connection,
    registration_ids: &[i64],
) -> Result<HashMap<i64, Vec<String>>> {
    if registration_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=registration_ids.len())
        .map(|i| format!("?{}", i))
        .collect();
    let sql = format!(
        "SELECT registration_id, activity_label FROM registration_activities
         WHERE registration_id IN ({})
         ORDER BY id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = registration_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut grouped: HashMap<i64, Vec<String>> = HashMap::new();
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;
    for row in rows {
        let (registration_id, label) = row?;
        grouped.entry(registration_id).or_default().push(label);
    }

    Ok(grouped)
}

fn query_participants(
    conn: &Connection,
    chat_ids: &[i64],
) -> Result<HashMap<i64, Vec<ChatParticipant>>> {
    if chat_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=chat_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT cp.chat_id, cp.registration_id,
                COALESCE(r.representative_name, 'unknown'),
                COALESCE(r.company_name, '')
         FROM chat_participants cp
         LEFT JOIN registrations r ON cp.registration_id = r.id
         WHERE cp.chat_id IN ({})
         ORDER BY cp.chat_id, cp.id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::types::ToSql> = chat_ids
        .iter()
        .map(|id| id as &dyn rusqlite::types::ToSql)
        .collect();

    let mut grouped: HashMap<i64, Vec<ChatParticipant>> = HashMap::new();
    let rows = stmt.query_map(params.as_slice(), |row| {
        Ok((
            row.get::<_, i64>(0)?,
            ChatParticipant {
                registration_id: row.get(1)?,
                name: row.get(2)?,
                company: row.get(3)?,
            },
        ))
    })?;
    for row in rows {
        let (chat_id, participant) = row?;
        grouped.entry(chat_id).or_default().push(participant);
    }

    Ok(grouped)
}
