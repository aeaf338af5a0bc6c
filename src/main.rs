//! crm-cars binary entrypoint wiring configuration, storage supervision and the REST layer.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crm_cars::{
    config::{AppConfig, StorageBackend},
    dao::{
        car_store::{CarStore, memory::MemoryCarStore},
        storage::StorageError,
    },
    routes,
    services::storage_supervisor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let backend = StorageBackend::from_env().context("selecting storage backend")?;
    info!(?backend, "using storage backend");

    let app_state = AppState::new(config);
    spawn_storage_supervisor(app_state.clone(), backend);

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Run the storage supervisor for the selected backend in the background.
fn spawn_storage_supervisor(state: SharedState, backend: StorageBackend) {
    match backend {
        #[cfg(feature = "mongo-store")]
        StorageBackend::Mongo => {
            tokio::spawn(storage_supervisor::run(state, connect_mongo));
        }
        #[cfg(feature = "couch-store")]
        StorageBackend::Couch => {
            tokio::spawn(storage_supervisor::run(state, connect_couch));
        }
        StorageBackend::Memory => {
            tokio::spawn(storage_supervisor::run(state, connect_memory));
        }
    }
}

#[cfg(feature = "mongo-store")]
async fn connect_mongo() -> Result<Arc<dyn CarStore>, StorageError> {
    use crm_cars::dao::car_store::mongodb::{MongoCarStore, MongoConfig};

    let config = MongoConfig::from_env().await?;
    let store = MongoCarStore::connect(config).await?;
    Ok(Arc::new(store))
}

#[cfg(feature = "couch-store")]
async fn connect_couch() -> Result<Arc<dyn CarStore>, StorageError> {
    use crm_cars::dao::car_store::couchdb::{CouchCarStore, CouchConfig};

    let config = CouchConfig::from_env();
    let store = CouchCarStore::connect(config).await?;
    Ok(Arc::new(store))
}

async fn connect_memory() -> Result<Arc<dyn CarStore>, StorageError> {
    Ok(Arc::new(MemoryCarStore::new()))
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
