use axum::{debug_handler, extract::State, Json};
use sqlx::SqlitePool;

use crate::{db, model::Chat, AppResult, AppState};

#[debug_handler(state = AppState)]
pub(crate) async fn list_chats(State(db_pool): State<SqlitePool>) -> AppResult<Json<Vec<Chat>>> {
    let chats = db::list_chats(&db_pool).await?;
    tracing::debug!(count = chats.len(), "listing chats");
    Ok(Json(chats))
}
