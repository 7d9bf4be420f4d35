use axum::{debug_handler, extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{AppError, AppResult, AppState, Config};

use super::ApiJson;

const START_COMMAND: &str = "/start";

/// Outbound side of the Telegram bot: answers `/start` with a button that
/// opens the Mini-App.
#[derive(Clone)]
pub struct TelegramBot {
    http_client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    mini_app_url: Option<String>,
}

impl TelegramBot {
    pub fn from_config(config: &Config) -> Self {
        if config.telegram_bot_token.is_none() {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set, /start will fail");
        }

        Self {
            http_client: reqwest::Client::new(),
            api_url: config.telegram_api_url.trim_end_matches('/').to_owned(),
            token: config.telegram_bot_token.clone(),
            mini_app_url: config.mini_app_url.clone(),
        }
    }

    pub async fn send_mini_app_button(&self, chat_id: i64) -> AppResult<()> {
        let token = self.token.as_deref().ok_or("TELEGRAM_BOT_TOKEN not configured")?;
        let mini_app_url = self.mini_app_url.as_deref().ok_or("MINI_APP_URL not configured")?;

        let response = self
            .http_client
            .post(format!("{}/bot{token}/sendMessage", self.api_url))
            .json(&SendMessage {
                chat_id,
                text: "Open the Mini App:",
                reply_markup: InlineKeyboard {
                    inline_keyboard: [[InlineButton { text: "Open App", url: mini_app_url }]],
                },
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(chat_id, %status, "telegram rejected sendMessage");
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    reply_markup: InlineKeyboard<'a>,
}

#[derive(Serialize)]
struct InlineKeyboard<'a> {
    inline_keyboard: [[InlineButton<'a>; 1]; 1],
}

#[derive(Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
struct IncomingMessage {
    chat: IncomingChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IncomingChat {
    id: i64,
}

/// Webhook endpoint for bot updates.
#[debug_handler(state = AppState)]
pub(crate) async fn link(
    State(telegram): State<TelegramBot>,
    ApiJson(Update { message }): ApiJson<Update>,
) -> AppResult<Json<Value>> {
    let Some(message) = message else {
        return Err(AppError::bad_request("Invalid request"));
    };

    if message.text.as_deref() == Some(START_COMMAND) {
        telegram.send_mini_app_button(message.chat.id).await?;
        tracing::info!(chat_id = message.chat.id, "sent mini app button");
        return Ok(Json(json!({ "message": "Sent mini app button" })));
    }

    Ok(Json(json!({ "message": "No action taken" })))
}
