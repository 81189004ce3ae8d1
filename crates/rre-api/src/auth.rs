use axum::{Json, extract::State};
use tracing::info;

use rre_types::api::LoginRequest;
use rre_types::models::PublicUser;

use crate::error::{ApiError, ApiResult, blocking};
use crate::state::AppState;

/// POST /login — exact email + issued credential + validated flag.
/// A non-match is a 401, not a distinguishable "wrong password" signal.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<PublicUser>> {
    let registration = blocking(move || state.db.authenticate(&req.email, &req.password))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Email ou mot de passe incorrect".into()))?;

    info!(id = registration.id, "Attendee logged in");
    Ok(Json(registration.public()))
}
