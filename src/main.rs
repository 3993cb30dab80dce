use std::sync::Arc;
use tokio::fs;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};
use wellness_tracker::{
    AppState, Config, EntryStore, LocalStorage, SessionStore, router, spawn_session_sync,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    if let Some(parent) = config.data_path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let storage = LocalStorage::load(&config.data_path).await;
    let session = SessionStore::load(storage.clone()).await;
    let entries = EntryStore::load(storage.clone(), config.seed_demo).await?;
    let state = AppState::new(session, entries);
    spawn_session_sync(Arc::clone(&state.session), storage.subscribe());
    storage.watch_file(config.watch_interval);

    let app = router(state);
    let addr = config.listen_addr();

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutting down"),
        Err(err) => {
            error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    }
}
