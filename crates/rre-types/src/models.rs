use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activities::ActivityOption;

// -- Registrations --

/// A company's sign-up record, the root identity for every per-user action.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
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
    pub validated_at: Option<DateTime<Utc>>,
    pub user_password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub activities: Vec<ActivityOption>,
}

/// What a logged-in attendee sees about themselves. Never carries the
/// stored credential.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub company_name: String,
    pub representative_name: String,
    pub position: String,
    pub email: String,
    pub selected_event: String,
    pub activities: Vec<ActivityOption>,
}

impl Registration {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            company_name: self.company_name.clone(),
            representative_name: self.representative_name.clone(),
            position: self.position.clone(),
            email: self.email.clone(),
            selected_event: self.selected_event.clone(),
            activities: self.activities.clone(),
        }
    }
}

/// Attributes of a submission before it has an id. The service fills in
/// flags, credential and timestamps.
#[derive(Debug, Clone)]
pub struct NewRegistration {
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
}

// -- Wall --

/// An image or document attached to a wall post. `mime_type` is only
/// recorded for documents.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMedia {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WallPost {
    pub id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub is_deleted: bool,
    pub likes_count: i64,
    pub comments_count: i64,
    pub images: Vec<PostMedia>,
    pub documents: Vec<PostMedia>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub content: String,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Chat --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatKind {
    Direct,
    Group,
    AdminSupport,
}

impl ChatKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatKind::Direct => "direct",
            ChatKind::Group => "group",
            ChatKind::AdminSupport => "admin-support",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(ChatKind::Direct),
            "group" => Some(ChatKind::Group),
            "admin-support" => Some(ChatKind::AdminSupport),
            _ => None,
        }
    }
}

/// One hit of the chat-partner search: a validated attendee with their
/// activity labels for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub company: String,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatParticipant {
    pub registration_id: i64,
    pub name: String,
    pub company: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

/// One entry of the chat-list view: the chat plus its denormalized last
/// message and participant set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSummary {
    pub id: i64,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub participants: Vec<ChatParticipant>,
    pub last_message: Option<ChatMessage>,
    pub created_at: DateTime<Utc>,
}
