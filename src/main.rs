//! Brew Guide - a chat bot that walks users through brewing recipes
//!
//! Telegram updates arrive on a webhook, are processed per chat by a pure
//! state machine, and replies leave through a background delivery queue.

mod api;
mod clock;
mod config;
mod db;
mod i18n;
mod router;
mod runtime;
mod state_machine;
mod telegram;
mod timer;

use api::{create_router, AppState};
use clock::SystemClock;
use config::BotConfig;
use db::Database;
use runtime::{
    ChatRuntime, DatabaseStorage, ProductionRuntime, RuntimeManager, DEFAULT_IDLE_TIMEOUT,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use telegram::{spawn_delivery, TelegramClient};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brew_guide=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = BotConfig::from_env();

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&config.db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %config.db_path, "Opening database");
    let db = Database::open(&config.db_path)?;

    if config.seed_recipes {
        let seeded = db.seed_recipes()?;
        if seeded > 0 {
            tracing::info!(count = seeded, "Seeded bundled recipes");
        }
    }

    let client = match config.telegram_token.as_deref() {
        Some(token) => Some(TelegramClient::new(&config.telegram_api_url, token)?),
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN not set; replies will only be logged");
            None
        }
    };
    let (delivery, delivery_task) = spawn_delivery(client);

    let runtime: Arc<ProductionRuntime> = Arc::new(ChatRuntime::new(
        DatabaseStorage::new(db),
        delivery,
        Arc::new(SystemClock),
        config.timer_grace,
    ));
    let manager = Arc::new(RuntimeManager::new(runtime, DEFAULT_IDLE_TIMEOUT));

    let state = AppState::new(manager, config.webhook_secret.clone());
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Brew Guide listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Workers hold queue handles; give in-flight replies a moment to leave
    if tokio::time::timeout(std::time::Duration::from_secs(5), delivery_task)
        .await
        .is_err()
    {
        tracing::warn!("Delivery queue not drained at shutdown");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
