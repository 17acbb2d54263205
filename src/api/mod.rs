//! HTTP interface.
//!
//! An axum router over [`AppState`]. Handlers are thin: they authenticate via
//! [`extract::AdminSession`] where needed, call into `core`, and let
//! [`crate::errors::Error`] render the failure body.

pub mod error;
pub mod extract;
mod routes;

use crate::{
    config::settings::Settings,
    core::auth::TokenKeys,
    errors::Result,
    notify::Notifier,
};
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use sea_orm::DatabaseConnection;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Pooled database connection
    pub db: DatabaseConnection,
    /// Immutable runtime settings
    pub settings: Arc<Settings>,
    /// Session token keys
    pub keys: Arc<TokenKeys>,
    /// Notification queue
    pub notifier: Notifier,
}

impl AppState {
    /// Builds the state, deriving token keys from the settings.
    #[must_use]
    pub fn new(db: DatabaseConnection, settings: Settings, notifier: Notifier) -> Self {
        let keys = TokenKeys::new(&settings.jwt_secret, settings.token_ttl);
        Self {
            db,
            settings: Arc::new(settings),
            keys: Arc::new(keys),
            notifier,
        }
    }
}

/// The complete application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .nest("/api", routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Binds the configured port and serves until Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> Result<()> {
    let address = format!("0.0.0.0:{}", state.settings.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
