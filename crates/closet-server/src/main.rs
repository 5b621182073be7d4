use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

use closet_server::api::{self, AppState};
use closet_server::config::ServerConfig;
use closet_server::image_store::ImageStore;
use closet_server::rate_limit::RequestThrottle;
use closet_server::recommend::Recommender;
use closet_server::session::SessionIssuer;
use closet_shared::constants::APP_NAME;
use closet_store::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("info,closet_server=debug,closet_store=debug")
            }),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");
    if std::env::var("GEMINI_API_KEY").map_or(true, |k| k.trim().is_empty()) {
        tracing::warn!("GEMINI_API_KEY not set; /recommend-outfit will answer 500 until it is");
    }

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;
    info!(path = %config.database_path.display(), "Database ready");

    let images = Arc::new(
        ImageStore::new(config.image_storage_path.clone(), config.max_image_size).await?,
    );

    let recommender = Arc::new(Recommender::new(
        config.gemini_base_url.clone(),
        Duration::from_secs(config.gemini_timeout_secs),
    )?);

    let throttle = RequestThrottle::new(config.throttle_rate, config.throttle_burst);

    let app_state = AppState {
        db: Arc::new(Mutex::new(db)),
        sessions: SessionIssuer::from_config(&config),
        images,
        recommender,
        throttle: throttle.clone(),
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Throttle cleanup (every 5 minutes, evict buckets idle >10 min)
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            throttle.purge_idle(600.0).await;
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
