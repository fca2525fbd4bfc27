use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::Router;
use common::utils::logging::init_logging;
use configs::AppConfig;
use dotenvy::dotenv;
use tokio::sync::mpsc;
use tracing::{info, warn};

use service::access::AllowList;
use service::bot::{worker, AccessPolicy, MessageRouter};
use service::i18n::Messages;
use service::storage::NoteStore;

use crate::errors::StartupError;
use crate::routes::{self, AppState};
use crate::telegram::TelegramClient;

/// Pending updates held before the webhook starts pushing back.
const QUEUE_CAPACITY: usize = 256;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Public entry: load configuration and runtime files, register the webhook
/// and serve until ctrl-c.
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    let cfg = AppConfig::load_and_validate().map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    init_logging(&cfg.log.format, cfg.bot.debug_mode);

    let admin_id = cfg
        .bot
        .admin_id
        .ok_or_else(|| StartupError::InvalidConfig("bot.admin_id is not set".into()))?;

    common::env::ensure_parent_dir(&cfg.storage.data_path).await?;

    // Templates and the allow-list must be sane before any event is served.
    let messages = Arc::new(Messages::load(&cfg.storage.messages_path).await?);
    if cfg.bot.enable_whitelist {
        common::env::warn_if_missing(&cfg.storage.whitelist_path, "allow-list file").await;
    }
    let allow_list = Arc::new(AllowList::load(&cfg.storage.whitelist_path).await?);
    let store = NoteStore::load(&cfg.storage.data_path).await;

    let telegram = Arc::new(TelegramClient::new(
        &cfg.bot.api_base_url,
        &cfg.bot.token,
        Duration::from_secs(cfg.bot.request_timeout_secs),
    )?);
    telegram
        .set_webhook(&cfg.bot.webhook_url, cfg.bot.webhook_secret.as_deref())
        .await
        .map_err(|e| StartupError::Runtime(format!("webhook registration failed: {e}")))?;

    let router = Arc::new(MessageRouter::new(
        store,
        allow_list,
        messages,
        AccessPolicy { admin_id, enforce_allow_list: cfg.bot.enable_whitelist },
    ));

    let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
    let worker = tokio::spawn(worker::run(rx, router, telegram));

    if cfg.bot.webhook_secret.is_none() {
        warn!("no webhook secret configured; webhook calls are not authenticated");
    }
    let state = AppState { queue: tx, secret: cfg.bot.webhook_secret.clone() };
    let app: Router = routes::build_router(state, &cfg.bot.webhook_path);

    let addr: SocketAddr = cfg.server.bind_addr().parse()?;
    info!(%addr, webhook_path = %cfg.bot.webhook_path, allow_list = cfg.bot.enable_whitelist, "starting bot server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router owned the only queue sender; the worker finishes what is queued.
    worker.await?;
    info!("bot server stopped");
    Ok(())
}
