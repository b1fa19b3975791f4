use chain_op_watcher::{
    blockchain::{polling::EngineSettings, BlockProcessor, SteemClient, SyncEngine},
    config::Config,
    db::SqliteStore,
    lock::InstanceLock,
    notify::{NotificationRouter, TelegramSink},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting chain-op-watcher");

    // Load configuration: explicit path argument, else CONFIG_PATH / config.yaml
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::from_env()?,
    };
    info!(
        "Configuration loaded: api_url={}, start_block={}, accounts={}",
        config.steem.api_url,
        config.steem.start_block,
        config.steem.accounts.len()
    );

    // Single writer per database
    let _lock = InstanceLock::acquire(&config.sync.lock_file).map_err(|e| {
        error!("Another sync instance appears to be running: {}", e);
        e
    })?;

    let store = SqliteStore::open(&config.database.url).await?;
    info!("Database ready at {}", config.database.url);

    let chain = SteemClient::new(&config)?;
    let processor = BlockProcessor::new(config.steem.accounts.iter().cloned());

    let router = if config.telegram.is_active() {
        let sink = TelegramSink::new(&config.telegram)?;
        NotificationRouter::from_config(&config.telegram, Arc::new(sink))
    } else {
        if config.telegram.enabled {
            warn!("Telegram is enabled but bot_token or channel_id is missing; notifications disabled");
        }
        NotificationRouter::disabled()
    };
    if router.is_enabled() {
        info!("Notifications enabled with {} rule(s)", router.rules().len());
    } else {
        info!("Notifications disabled");
    }

    let engine = SyncEngine::new(
        Arc::new(chain),
        Arc::new(store),
        processor,
        router,
        EngineSettings::from_config(&config),
    );

    let shutdown = CancellationToken::new();
    let engine_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { engine.run(shutdown).await })
    };

    wait_for_signal().await;
    info!("Shutdown signal received, stopping sync engine");
    shutdown.cancel();

    if let Err(e) = engine_task.await {
        error!("Sync engine task failed: {}", e);
    }

    info!("chain-op-watcher stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
