//! Speedmodelling backend binary entrypoint wiring REST routes over the shared state store.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod config;
mod dao;
mod dto;
mod error;
mod racer;
mod routes;
mod services;
mod state;

use config::AppConfig;
use dao::state_store::{StateStore, memory::MemoryStateStore};
use state::AppState;

const ADMIN_TOKEN_ENV: &str = "SPEEDMODELLING_ADMIN_TOKEN";
#[cfg(feature = "http-store")]
const STORE_URL_ENV: &str = "SPEEDMODELLING_STORE_URL";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let store = resolve_store()?;
    let admin_token = resolve_admin_token();

    let app_state = AppState::new(config, store, admin_token);
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

/// Pick the state store backend: a remote instance when a store URL is
/// configured, the in-process store otherwise.
fn resolve_store() -> anyhow::Result<Arc<dyn StateStore>> {
    #[cfg(feature = "http-store")]
    if let Ok(url) = env::var(STORE_URL_ENV) {
        use dao::state_store::http::{HttpStateStore, HttpStoreConfig};

        let store = HttpStateStore::new(HttpStoreConfig {
            base_url: url.clone(),
        })
        .context("building HTTP state store client")?;
        info!(%url, "using remote HTTP state store");
        return Ok(Arc::new(store));
    }

    info!("using in-memory state store");
    Ok(Arc::new(MemoryStateStore::new()))
}

/// Read the coordinator token from the environment, generating a one-off
/// token when none is configured.
fn resolve_admin_token() -> String {
    match env::var(ADMIN_TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => token,
        _ => {
            let token = Uuid::new_v4().to_string();
            warn!(%token, "no admin token configured; generated one for this run");
            token
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
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

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
