pub mod api;
pub mod appresult;
pub mod client;
pub mod config;
pub mod db;
pub mod model;
pub mod res;

use axum::{extract::FromRef, Router};
use sqlx::SqlitePool;
use tower_http::{cors::{Any, CorsLayer}, trace::TraceLayer};

pub use appresult::{AppError, AppResult};
pub use config::Config;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub telegram: api::bot::TelegramBot,
}

/// The whole HTTP surface: the JSON api under `/api`, open to any origin since
/// the Mini-App is loaded inside the Telegram web view.
pub fn app(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api::router())
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
