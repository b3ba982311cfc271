//! Exam Hall Back binary entrypoint wiring REST, SSE, mail, and document storage layers.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exam_hall_back::{
    config::AppConfig,
    dao::store::{BackendKind, memory::MemoryStore},
    routes,
    services::session_janitor,
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let app_state = AppState::new(config);

    start_storage(app_state.clone()).await?;
    tokio::spawn(session_janitor::run(
        app_state.clone(),
        session_janitor::PURGE_INTERVAL,
    ));
    // Build the HTTP router once the shared state is ready.
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

/// Install the in-memory store, or spawn the supervisor that keeps a database
/// connection alive and toggles degraded mode.
async fn start_storage(state: SharedState) -> anyhow::Result<()> {
    match BackendKind::from_env() {
        BackendKind::Memory => {
            info!("using in-memory storage; data is lost on restart");
            state.install_store(Arc::new(MemoryStore::new())).await;
        }
        #[cfg(feature = "mongo-store")]
        BackendKind::Mongo => {
            use exam_hall_back::dao::store::mongodb::{MongoConfig, MongoDocumentStore};
            use exam_hall_back::dao::store::DocumentStore;

            let config = MongoConfig::from_env()
                .await
                .context("reading MongoDB configuration")?;
            info!(database = %config.database_name, "using MongoDB storage");
            tokio::spawn(exam_hall_back::services::storage_supervisor::run(
                state,
                move || {
                    let config = config.clone();
                    async move {
                        MongoDocumentStore::connect(config)
                            .await
                            .map(|store| Arc::new(store) as Arc<dyn DocumentStore>)
                            .map_err(Into::into)
                    }
                },
            ));
        }
        #[cfg(feature = "couch-store")]
        BackendKind::Couch => {
            use exam_hall_back::dao::store::couchdb::{CouchConfig, CouchDocumentStore};
            use exam_hall_back::dao::store::DocumentStore;

            let config = CouchConfig::from_env().context("reading CouchDB configuration")?;
            info!(database = %config.database, "using CouchDB storage");
            tokio::spawn(exam_hall_back::services::storage_supervisor::run(
                state,
                move || {
                    let config = config.clone();
                    async move {
                        CouchDocumentStore::connect(config)
                            .await
                            .map(|store| Arc::new(store) as Arc<dyn DocumentStore>)
                            .map_err(Into::into)
                    }
                },
            ));
        }
        #[allow(unreachable_patterns)]
        other => {
            warn!(backend = ?other, "storage backend not compiled in; staying in degraded mode");
        }
    }
    Ok(())
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
                warn!(error = %err, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}
