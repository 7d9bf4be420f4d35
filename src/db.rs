use anyhow::{anyhow, Context};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::{
    model::{Chat, Language, Theme, User},
    res,
};

type ChatRow = (i64, String, String, i64, String, String);
type UserRow = (i64, String, String, String);

const USER_COLUMNS: &str = "telegram_id,theme,language,saved_chats";

pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(database_url)
        .await?;
    init_schema(&db_pool).await?;
    Ok(db_pool)
}

/// A private in-memory database. One connection that never expires, since
/// every new sqlite memory connection starts empty.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    init_schema(&db_pool).await?;
    Ok(db_pool)
}

pub async fn init_schema(db_pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(res::SCHEMA).execute(db_pool).await?;
    Ok(())
}

fn chat_from_row((id, short_name, long_name, semester, role, link): ChatRow) -> Chat {
    Chat { id, short_name, long_name, semester, role, link }
}

fn user_from_row((telegram_id, theme, language, saved_chats): UserRow) -> anyhow::Result<User> {
    Ok(User {
        telegram_id,
        theme: Theme::from_code(&theme)
            .ok_or_else(|| anyhow!("user {telegram_id} has unknown theme {theme:?}"))?,
        language: Language::from_code(&language)
            .ok_or_else(|| anyhow!("user {telegram_id} has unknown language {language:?}"))?,
        saved_chats: serde_json::from_str(&saved_chats)
            .with_context(|| format!("user {telegram_id} has malformed saved_chats"))?,
    })
}

pub async fn list_chats(db_pool: &SqlitePool) -> Result<Vec<Chat>, sqlx::Error> {
    let rows: Vec<ChatRow> = sqlx::query_as(
        "SELECT id,short_name,long_name,semester,role,link FROM chats ORDER BY short_name ASC, id ASC",
    )
    .fetch_all(db_pool)
    .await?;

    Ok(rows.into_iter().map(chat_from_row).collect())
}

/// Upserts the given chats by id.
pub async fn seed_chats(db_pool: &SqlitePool, chats: &[Chat]) -> Result<(), sqlx::Error> {
    let mut tx = db_pool.begin().await?;
    for chat in chats {
        sqlx::query("INSERT OR REPLACE INTO chats (id,short_name,long_name,semester,role,link) VALUES (?,?,?,?,?,?)")
            .bind(chat.id)
            .bind(&chat.short_name)
            .bind(&chat.long_name)
            .bind(chat.semester)
            .bind(&chat.role)
            .bind(&chat.link)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn find_user(db_pool: &SqlitePool, telegram_id: i64) -> anyhow::Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE telegram_id=?"))
        .bind(telegram_id)
        .fetch_optional(db_pool)
        .await?;

    row.map(user_from_row).transpose()
}

/// Returns the user and whether this call created it.
pub async fn find_or_create_user(db_pool: &SqlitePool, telegram_id: i64) -> anyhow::Result<(User, bool)> {
    if let Some(user) = find_user(db_pool, telegram_id).await? {
        return Ok((user, false));
    }

    let defaults = User::new(telegram_id);
    let inserted = sqlx::query(
        "INSERT INTO users (telegram_id,theme,language,saved_chats) VALUES (?,?,?,'[]') ON CONFLICT(telegram_id) DO NOTHING",
    )
    .bind(telegram_id)
    .bind(defaults.theme.as_str())
    .bind(defaults.language.as_str())
    .execute(db_pool)
    .await?
    .rows_affected()
        == 1;

    // another request may have won the insert
    let user = find_user(db_pool, telegram_id)
        .await?
        .ok_or_else(|| anyhow!("user {telegram_id} vanished after insert"))?;
    Ok((user, inserted))
}

async fn update_column(
    db_pool: &SqlitePool,
    telegram_id: i64,
    column: &'static str,
    value: String,
) -> anyhow::Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(&format!(
        "UPDATE users SET {column}=? WHERE telegram_id=? RETURNING {USER_COLUMNS}"
    ))
    .bind(value)
    .bind(telegram_id)
    .fetch_optional(db_pool)
    .await?;

    row.map(user_from_row).transpose()
}

pub async fn update_language(db_pool: &SqlitePool, telegram_id: i64, language: Language) -> anyhow::Result<Option<User>> {
    update_column(db_pool, telegram_id, "language", language.as_str().to_owned()).await
}

pub async fn update_theme(db_pool: &SqlitePool, telegram_id: i64, theme: Theme) -> anyhow::Result<Option<User>> {
    update_column(db_pool, telegram_id, "theme", theme.as_str().to_owned()).await
}

/// Replaces the whole saved list.
pub async fn update_saved_chats(db_pool: &SqlitePool, telegram_id: i64, saved_chats: &[i64]) -> anyhow::Result<Option<User>> {
    update_column(db_pool, telegram_id, "saved_chats", serde_json::to_string(saved_chats)?).await
}
