use mimalloc::MiMalloc;
use notes_api::config::Config;
use notes_api::db::{PgNoteStore, PgProvisioner};
use notes_api::router::{NotesState, notes_router};
use notes_api::service::SchemaInitializer;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let settings = cfg.connection_settings();
    let policy = cfg.retry_policy();
    info!(
        db = ?settings,
        max_attempts = policy.max_attempts,
        base_delay = ?policy.base_delay,
        connect_timeout = ?policy.connect_timeout,
        loglevel = %cfg.loglevel,
        "starting notes api"
    );

    let provisioner = Arc::new(PgProvisioner::new(
        settings.clone(),
        policy,
        cfg.seed_text.clone(),
    ));
    let initializer = Arc::new(SchemaInitializer::new(provisioner));

    if !initializer.ensure_ready().await {
        warn!("database not ready at startup; initialization will be retried on first request");
    }

    let store = Arc::new(PgNoteStore::new(&settings, policy.connect_timeout));
    let state = NotesState::new(store, initializer, &cfg);
    let app = notes_router(state);

    let listener = TcpListener::bind(cfg.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
