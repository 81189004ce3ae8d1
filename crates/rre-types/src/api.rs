use serde::{Deserialize, Serialize};

use crate::models::{ChatKind, Registration};

// -- Registration --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub company_name: String,
    /// Catalog ids; labels and categories are resolved server-side.
    pub selected_activities: Vec<String>,
    pub company_size: String,
    pub address: String,
    pub representative_name: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    pub selected_event: String,
    #[serde(default)]
    pub additional_info: String,
    #[serde(default)]
    pub accept_terms: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidateRequest {
    pub registration_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    pub registration: Registration,
    pub email_sent: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// -- Wall --

/// Reference to an already-uploaded file, as returned by the upload
/// endpoint and echoed back when creating a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub name: String,
    pub url: String,
    pub size: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub images: Vec<MediaRef>,
    #[serde(default)]
    pub documents: Vec<MediaRef>,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub post_id: i64,
    pub content: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeletePostRequest {
    pub post_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Post,
    Comment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToggleLikeRequest {
    pub target_id: i64,
    pub user_id: i64,
    pub kind: LikeKind,
}

#[derive(Debug, Serialize)]
pub struct ToggleLikeResponse {
    pub liked: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedQuery {
    pub post_id: Option<i64>,
    pub comment_id: Option<i64>,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsQuery {
    pub post_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddCommentRequest {
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub comment_id: i64,
    pub content: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteCommentRequest {
    pub comment_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub files: Vec<MediaRef>,
}

// -- Chat --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatsQuery {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchQuery {
    #[serde(default)]
    pub q: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    pub creator_id: i64,
    #[serde(default)]
    pub participant_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesQuery {
    pub chat_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub sender_id: i64,
    pub content: String,
    #[serde(default)]
    pub is_admin: bool,
}
