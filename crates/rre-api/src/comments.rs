use axum::{Json, extract::Query, extract::State};
use serde_json::{Value, json};

use rre_types::api::{
    AddCommentRequest, CommentsQuery, DeleteCommentRequest, UpdateCommentRequest,
};
use rre_types::models::Comment;

use crate::error::{ApiError, ApiResult, blocking};
use crate::state::AppState;

/// GET /wall/comments?postId= — non-deleted comments, oldest first.
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    let comments = blocking(move || state.db.list_comments(query.post_id)).await?;
    Ok(Json(comments))
}

/// POST /wall/comments
pub async fn add_comment(
    State(state): State<AppState>,
    Json(req): Json<AddCommentRequest>,
) -> ApiResult<Json<Comment>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("Le commentaire est vide".into()));
    }

    let st = state.clone();
    let post_id = req.post_id;
    let exists = blocking(move || st.db.post_owner(post_id)).await?;
    if exists.is_none() {
        return Err(ApiError::NotFound("Publication introuvable".into()));
    }

    let st = state.clone();
    let content = req.content.trim().to_string();
    let comment_id =
        blocking(move || st.db.add_comment(req.post_id, req.user_id, &content)).await?;

    let comment = blocking(move || state.db.get_comment(comment_id))
        .await?
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("Comment {comment_id} vanished")))?;
    Ok(Json(comment))
}

/// PUT /wall/comments — owner-only.
pub async fn update_comment(
    State(state): State<AppState>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<Json<Comment>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("Le commentaire est vide".into()));
    }

    check_comment_ownership(&state, req.comment_id, req.user_id).await?;

    let st = state.clone();
    let comment_id = req.comment_id;
    let content = req.content.trim().to_string();
    blocking(move || st.db.update_comment(comment_id, &content)).await?;

    let comment = blocking(move || state.db.get_comment(comment_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Commentaire introuvable".into()))?;
    Ok(Json(comment))
}

/// DELETE /wall/comments — soft delete, owner-only.
pub async fn delete_comment(
    State(state): State<AppState>,
    Json(req): Json<DeleteCommentRequest>,
) -> ApiResult<Json<Value>> {
    check_comment_ownership(&state, req.comment_id, req.user_id).await?;

    let comment_id = req.comment_id;
    blocking(move || state.db.soft_delete_comment(comment_id)).await?;
    Ok(Json(json!({ "success": true })))
}

async fn check_comment_ownership(
    state: &AppState,
    comment_id: i64,
    user_id: i64,
) -> ApiResult<()> {
    let st = state.clone();
    let (owner_id, is_deleted) = blocking(move || st.db.comment_owner(comment_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Commentaire introuvable".into()))?;

    if is_deleted || owner_id != user_id {
        return Err(ApiError::Forbidden(
            "Vous ne pouvez modifier que vos propres commentaires".into(),
        ));
    }
    Ok(())
}
