use axum::{Json, extract::Query, extract::State};
use tracing::info;

use rre_types::api::{
    ChatsQuery, CreateChatRequest, MessagesQuery, SendMessageRequest, UserSearchQuery,
};
use rre_types::models::{ChatKind, ChatMessage, ChatSummary, ChatUser};

use crate::error::{ApiError, ApiResult, blocking};
use crate::state::AppState;

/// GET /chat/chats?userId= — the user's chats, most recently active first.
pub async fn list_chats(
    State(state): State<AppState>,
    Query(query): Query<ChatsQuery>,
) -> ApiResult<Json<Vec<ChatSummary>>> {
    let chats = blocking(move || state.db.list_chats(query.user_id)).await?;
    Ok(Json(chats))
}

/// GET /chat/users?q=&userId= — validated attendees available to chat
/// with, excluding the requester.
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<UserSearchQuery>,
) -> ApiResult<Json<Vec<ChatUser>>> {
    let users = blocking(move || state.db.search_users(&query.q, query.user_id)).await?;
    Ok(Json(users))
}

/// POST /chat/chats — direct and group chats need someone to talk to;
/// an admin-support chat may hold the creator alone. For a direct pair
/// this is get-or-create: an existing chat between the two is returned
/// instead of a duplicate.
pub async fn create_chat(
    State(state): State<AppState>,
    Json(req): Json<CreateChatRequest>,
) -> ApiResult<Json<ChatSummary>> {
    let mut participants: Vec<i64> = vec![req.creator_id];
    for id in &req.participant_ids {
        if !participants.contains(id) {
            participants.push(*id);
        }
    }

    if matches!(req.kind, ChatKind::Direct | ChatKind::Group) && participants.len() < 2 {
        return Err(ApiError::Validation(
            "Au moins un autre participant est requis".into(),
        ));
    }

    if req.kind == ChatKind::Direct && participants.len() == 2 {
        let st = state.clone();
        let (a, b) = (participants[0], participants[1]);
        if let Some(chat_id) = blocking(move || st.db.find_direct_chat(a, b)).await? {
            let st = state.clone();
            let chat = blocking(move || st.db.get_chat(chat_id))
                .await?
                .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("Chat {chat_id} vanished")))?;
            info!(chat_id, "Existing direct chat reused");
            return Ok(Json(chat));
        }
    }

    let st = state.clone();
    let name = req.name.clone();
    let kind = req.kind;
    let chat_id =
        blocking(move || st.db.create_chat(name.as_deref(), kind, &participants)).await?;

    let chat = blocking(move || state.db.get_chat(chat_id))
        .await?
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("Chat {chat_id} vanished")))?;

    info!(chat_id, kind = kind.as_str(), "Chat created");
    Ok(Json(chat))
}

/// GET /chat/messages?chatId= — ascending chronological order.
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let st = state.clone();
    let chat_id = query.chat_id;
    if !blocking(move || st.db.chat_exists(chat_id)).await? {
        return Err(ApiError::NotFound("Conversation introuvable".into()));
    }

    let messages = blocking(move || state.db.list_messages(chat_id)).await?;
    Ok(Json(messages))
}

/// POST /chat/messages — insert, repoint the chat's last-message reference,
/// return the annotated message.
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<Json<ChatMessage>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("Le message est vide".into()));
    }

    let st = state.clone();
    let chat_id = req.chat_id;
    if !blocking(move || st.db.chat_exists(chat_id)).await? {
        return Err(ApiError::NotFound("Conversation introuvable".into()));
    }

    let content = req.content.trim().to_string();
    let message = blocking(move || {
        state
            .db
            .insert_message(req.chat_id, req.sender_id, &content, req.is_admin)
    })
    .await?;

    Ok(Json(message))
}
