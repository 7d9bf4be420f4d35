use axum::{debug_handler, extract::{Path, State}, http::StatusCode, Json};
use sqlx::SqlitePool;

use crate::{
    db,
    model::{LanguageBody, SavedChatsBody, TelegramId, ThemeBody, User},
    AppError, AppResult, AppState,
};

use super::ApiJson;

fn found(telegram_id: i64, user: Option<User>) -> AppResult<Json<User>> {
    user.map(Json)
        .ok_or_else(|| AppError::not_found(format!("User {telegram_id} not found")))
}

/// 201 when this request created the record, 200 when it already existed.
#[debug_handler(state = AppState)]
pub(crate) async fn find_or_create_user(
    Path(telegram_id): Path<String>,
    State(db_pool): State<SqlitePool>,
) -> AppResult<(StatusCode, Json<User>)> {
    let TelegramId(telegram_id) = telegram_id.parse::<TelegramId>()?;

    let (user, created) = db::find_or_create_user(&db_pool, telegram_id).await?;
    if created {
        tracing::info!(telegram_id, "created user with default preferences");
        return Ok((StatusCode::CREATED, Json(user)));
    }

    Ok((StatusCode::OK, Json(user)))
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_language(
    Path(telegram_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    ApiJson(LanguageBody { language }): ApiJson<LanguageBody>,
) -> AppResult<Json<User>> {
    let TelegramId(telegram_id) = telegram_id.parse::<TelegramId>()?;

    let user = db::update_language(&db_pool, telegram_id, language).await?;
    tracing::debug!(telegram_id, %language, "language updated");
    found(telegram_id, user)
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_theme(
    Path(telegram_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    ApiJson(ThemeBody { theme }): ApiJson<ThemeBody>,
) -> AppResult<Json<User>> {
    let TelegramId(telegram_id) = telegram_id.parse::<TelegramId>()?;

    let user = db::update_theme(&db_pool, telegram_id, theme).await?;
    tracing::debug!(telegram_id, %theme, "theme updated");
    found(telegram_id, user)
}

#[debug_handler(state = AppState)]
pub(crate) async fn update_saved_chats(
    Path(telegram_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    ApiJson(SavedChatsBody { saved_chats_ids }): ApiJson<SavedChatsBody>,
) -> AppResult<Json<User>> {
    let TelegramId(telegram_id) = telegram_id.parse::<TelegramId>()?;

    let user = db::update_saved_chats(&db_pool, telegram_id, &saved_chats_ids).await?;
    tracing::debug!(telegram_id, saved = saved_chats_ids.len(), "saved chats replaced");
    found(telegram_id, user)
}
