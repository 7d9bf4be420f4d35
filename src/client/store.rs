use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::model::{Chat, Language, LanguageBody, SavedChatsBody, Theme, ThemeBody, User};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed with status: {0}")]
    Http(StatusCode),
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
}

/// Whether fetching a user found an existing record or created a fresh one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Created(T),
    Existing(T),
}

/// The backend holding the chat catalog and per-user preferences.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<Chat>, ClientError>;

    /// Loads the user, creating a default record on first contact.
    async fn fetch_user(&self, telegram_id: i64) -> Result<Fetched<User>, ClientError>;

    async fn put_language(&self, telegram_id: i64, language: Language) -> Result<User, ClientError>;

    async fn put_theme(&self, telegram_id: i64, theme: Theme) -> Result<User, ClientError>;

    async fn put_saved_chats(&self, telegram_id: i64, saved_chats_ids: &[i64]) -> Result<User, ClientError>;
}

/// [`PreferenceStore`] over the JSON api, e.g. `https://host/api`.
#[derive(Debug, Clone)]
pub struct HttpPreferenceStore {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpPreferenceStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http_client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { http_client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<User, ClientError> {
        let response = self.http_client.put(self.url(path)).json(body).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Http(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PreferenceStore for HttpPreferenceStore {
    async fn fetch_catalog(&self) -> Result<Vec<Chat>, ClientError> {
        let response = self.http_client.get(self.url("/chats")).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::Http(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn fetch_user(&self, telegram_id: i64) -> Result<Fetched<User>, ClientError> {
        let response = self
            .http_client
            .get(self.url(&format!("/user/{telegram_id}/user")))
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(Fetched::Created(response.json().await?)),
            StatusCode::OK => Ok(Fetched::Existing(response.json().await?)),
            status => Err(ClientError::Http(status)),
        }
    }

    async fn put_language(&self, telegram_id: i64, language: Language) -> Result<User, ClientError> {
        self.put(&format!("/user/{telegram_id}/language"), &LanguageBody { language }).await
    }

    async fn put_theme(&self, telegram_id: i64, theme: Theme) -> Result<User, ClientError> {
        self.put(&format!("/user/{telegram_id}/theme"), &ThemeBody { theme }).await
    }

    async fn put_saved_chats(&self, telegram_id: i64, saved_chats_ids: &[i64]) -> Result<User, ClientError> {
        let body = SavedChatsBody { saved_chats_ids: saved_chats_ids.to_vec() };
        self.put(&format!("/user/{telegram_id}/saved-chats"), &body).await
    }
}
