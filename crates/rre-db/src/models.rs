//! Database row types — these map directly to SQLite rows.
//! Distinct from the rre-types API models; the conversion functions here
//! are the only place raw rows become domain records.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use rre_types::activities::ActivityOption;
use rre_types::models::{ChatKind, ChatMessage, Registration};

pub struct RegistrationRow {
    pub id: i64,
    pub company_name: String,
    pub company_size: String,
    pub address: String,
    pub representative_name: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub selected_event: String,
    pub additional_info: String,
    pub accept_terms: bool,
    pub is_validated: bool,
    pub validated_at: Option<String>,
    pub user_password: Option<String>,
    pub created_at: String,
}

impl RegistrationRow {
    pub fn into_registration(self, activities: Vec<ActivityOption>) -> Registration {
        Registration {
            id: self.id,
            company_name: self.company_name,
            company_size: self.company_size,
            address: self.address,
            representative_name: self.representative_name,
            position: self.position,
            email: self.email,
            phone: self.phone,
            selected_event: self.selected_event,
            additional_info: self.additional_info,
            accept_terms: self.accept_terms,
            is_validated: self.is_validated,
            validated_at: self.validated_at.as_deref().map(parse_datetime),
            user_password: self.user_password,
            created_at: parse_datetime(&self.created_at),
            activities,
        }
    }
}

pub struct MessageRow {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl MessageRow {
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            sender_name: self.sender_name,
            content: self.content,
            is_admin: self.is_admin,
            created_at: parse_datetime(&self.created_at),
        }
    }
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
/// Parse as naive UTC and convert; fall back through RFC 3339 for values
/// written by chrono directly.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

pub fn parse_chat_kind(s: &str) -> ChatKind {
    ChatKind::parse(s).unwrap_or_else(|| {
        warn!("Unknown chat type '{}', treating as direct", s);
        ChatKind::Direct
    })
}
