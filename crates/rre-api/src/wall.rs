use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::info;

use rre_types::api::{CreatePostRequest, DeletePostRequest, UpdatePostRequest};
use rre_types::models::WallPost;

use crate::error::{ApiError, ApiResult, blocking};
use crate::state::AppState;

/// Per-post cap on each attachment kind, enforced here rather than by the
/// schema.
pub const MAX_MEDIA_PER_POST: usize = 5;

/// GET /wall/posts — non-deleted posts, newest first, with author, counts
/// and media.
pub async fn list_posts(State(state): State<AppState>) -> ApiResult<Json<Vec<WallPost>>> {
    let posts = blocking(move || state.db.list_posts()).await?;
    Ok(Json(posts))
}

/// POST /wall/posts — a post needs text or at least one attachment, and at
/// most 5 images and 5 documents.
pub async fn create_post(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<Json<WallPost>> {
    if req.images.len() > MAX_MEDIA_PER_POST {
        return Err(ApiError::Validation(
            "Maximum 5 images par publication".into(),
        ));
    }
    if req.documents.len() > MAX_MEDIA_PER_POST {
        return Err(ApiError::Validation(
            "Maximum 5 documents par publication".into(),
        ));
    }
    if req.content.trim().is_empty() && req.images.is_empty() && req.documents.is_empty() {
        return Err(ApiError::Validation(
            "Une publication doit contenir du texte ou une pièce jointe".into(),
        ));
    }

    let st = state.clone();
    let post_id = blocking(move || {
        st.db
            .create_post(req.user_id, req.content.trim(), &req.images, &req.documents)
    })
    .await?;

    let post = blocking(move || state.db.get_post(post_id))
        .await?
        .ok_or_else(|| ApiError::Dependency(anyhow::anyhow!("Post {post_id} vanished")))?;

    info!(post_id, author = post.author_id, "Wall post created");
    Ok(Json(post))
}

/// PUT /wall/posts — owner-only, and never on a soft-deleted post.
pub async fn update_post(
    State(state): State<AppState>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<WallPost>> {
    if req.content.trim().is_empty() {
        return Err(ApiError::Validation("Le contenu est requis".into()));
    }

    let st = state.clone();
    let post_id = req.post_id;
    check_post_ownership(&st, post_id, req.user_id).await?;

    let st = state.clone();
    let content = req.content.trim().to_string();
    blocking(move || st.db.update_post(post_id, &content)).await?;

    let post = blocking(move || state.db.get_post(post_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Publication introuvable".into()))?;
    Ok(Json(post))
}

/// DELETE /wall/posts — soft delete under the same ownership rule.
/// Attachments, comments and likes stay in storage.
pub async fn delete_post(
    State(state): State<AppState>,
    Json(req): Json<DeletePostRequest>,
) -> ApiResult<Json<Value>> {
    check_post_ownership(&state, req.post_id, req.user_id).await?;

    let post_id = req.post_id;
    blocking(move || state.db.soft_delete_post(post_id)).await?;

    info!(post_id, "Wall post soft-deleted");
    Ok(Json(json!({ "success": true })))
}

pub(crate) async fn check_post_ownership(
    state: &AppState,
    post_id: i64,
    user_id: i64,
) -> ApiResult<()> {
    let st = state.clone();
    let (owner_id, is_deleted) = blocking(move || st.db.post_owner(post_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Publication introuvable".into()))?;

    if is_deleted || owner_id != user_id {
        return Err(ApiError::Forbidden(
            "Vous ne pouvez modifier que vos propres publications".into(),
        ));
    }
    Ok(())
}
