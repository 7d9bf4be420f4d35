pub mod bot;
mod chats;
mod user;

use axum::{
    extract::FromRequest,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use crate::{AppError, AppState};

/// `axum::Json` whose rejections answer 400 with the usual error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health).fallback(method_not_allowed))
        .route("/chats", get(chats::list_chats).fallback(method_not_allowed))
        .route("/user/{telegram_id}/user", get(user::find_or_create_user).fallback(method_not_allowed))
        .route("/user/{telegram_id}/language", put(user::update_language).fallback(method_not_allowed))
        .route("/user/{telegram_id}/theme", put(user::update_theme).fallback(method_not_allowed))
        .route("/user/{telegram_id}/saved-chats", put(user::update_saved_chats).fallback(method_not_allowed))
        .route("/bot/link", post(bot::link).fallback(method_not_allowed))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed()
}
