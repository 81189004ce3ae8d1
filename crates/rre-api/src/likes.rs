use axum::{Json, extract::Query, extract::State};

use rre_types::api::{LikeKind, LikedQuery, ToggleLikeRequest, ToggleLikeResponse};

use crate::error::{ApiError, ApiResult, blocking};
use crate::state::AppState;

/// POST /wall/likes — toggle: present removes, absent inserts. Repeated
/// calls alternate state and never error. An unknown target is a 404
/// rather than a foreign-key failure.
pub async fn toggle_like(
    State(state): State<AppState>,
    Json(req): Json<ToggleLikeRequest>,
) -> ApiResult<Json<ToggleLikeResponse>> {
    let st = state.clone();
    let target_id = req.target_id;
    match req.kind {
        LikeKind::Post => {
            if blocking(move || st.db.post_owner(target_id)).await?.is_none() {
                return Err(ApiError::NotFound("Publication introuvable".into()));
            }
        }
        LikeKind::Comment => {
            if blocking(move || st.db.comment_owner(target_id)).await?.is_none() {
                return Err(ApiError::NotFound("Commentaire introuvable".into()));
            }
        }
    }

    let liked = blocking(move || match req.kind {
        LikeKind::Post => state.db.toggle_post_like(req.target_id, req.user_id),
        LikeKind::Comment => state.db.toggle_comment_like(req.target_id, req.user_id),
    })
    .await?;

    Ok(Json(ToggleLikeResponse { liked }))
}

/// GET /wall/likes?postId=|commentId=&userId= — whether the user currently
/// likes the target.
pub async fn liked(
    State(state): State<AppState>,
    Query(query): Query<LikedQuery>,
) -> ApiResult<Json<ToggleLikeResponse>> {
    let liked = match (query.post_id, query.comment_id) {
        (Some(post_id), None) => {
            blocking(move || state.db.post_liked(post_id, query.user_id)).await?
        }
        (None, Some(comment_id)) => {
            blocking(move || state.db.comment_liked(comment_id, query.user_id)).await?
        }
        _ => {
            return Err(ApiError::Validation(
                "postId ou commentId est requis".into(),
            ));
        }
    };

    Ok(Json(ToggleLikeResponse { liked }))
}
