use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::state::AppState;
use crate::{auth, chat, comments, likes, registrations, uploads, wall};

/// Upload batches can hold several documents at 10 MB each.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(registrations::register))
        .route("/registrations", get(registrations::list_registrations))
        .route(
            "/validate-registration",
            post(registrations::validate_registration),
        )
        .route("/login", post(auth::login))
        .route(
            "/wall/posts",
            get(wall::list_posts)
                .post(wall::create_post)
                .put(wall::update_post)
                .delete(wall::delete_post),
        )
        .route(
            "/wall/comments",
            get(comments::list_comments)
                .post(comments::add_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route("/wall/likes", get(likes::liked).post(likes::toggle_like))
        .route("/wall/upload", post(uploads::upload))
        .route(
            "/chat/chats",
            get(chat::list_chats).post(chat::create_chat),
        )
        .route("/chat/users", get(chat::search_users))
        .route(
            "/chat/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
