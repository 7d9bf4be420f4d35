use anyhow::Context;
use chatdir::{api::bot::TelegramBot, db, model::Chat, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let db_pool = db::connect(&config.database_url)
        .await
        .with_context(|| format!("failed to open {}", config.database_url))?;

    if let Some(chats_file) = &config.chats_file {
        let json = tokio::fs::read_to_string(chats_file)
            .await
            .with_context(|| format!("failed to read {}", chats_file.display()))?;
        let chats: Vec<Chat> = serde_json::from_str(&json)
            .with_context(|| format!("failed to parse {}", chats_file.display()))?;
        db::seed_chats(&db_pool, &chats).await?;
        tracing::info!(count = chats.len(), file = %chats_file.display(), "seeded chat catalog");
    }

    let app_state = AppState {
        db_pool,
        telegram: TelegramBot::from_config(&config),
    };

    let app = chatdir::app(app_state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "serving chat directory api");
    axum::serve(listener, app).await?;

    Ok(())
}
