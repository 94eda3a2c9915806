//! HTTP relay between browser-side extractors and the LLM provider.
//!
//! Exposes `POST /review`, `GET /health` and `GET /test-provider`, with
//! permissive CORS so extension pages on any origin can call it.

mod error;
mod handlers;
mod middleware;
mod router;
mod state;

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::providers::{ReviewProvider, RigProvider};

pub use error::ApiError;
pub use router::build_router;
pub use state::{AppState, SharedState};

/// Errors that stop the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Build the shared state from config.
///
/// A missing credential is not fatal: the relay still starts so `/health`
/// can report the problem, and `/review` answers 500.
pub fn state_from_config(config: &Config) -> SharedState {
    let credential_configured = config.provider.has_credential();
    let provider = match RigProvider::new(config.provider.clone()) {
        Ok(provider) => {
            info!(provider = %provider.label(), "provider ready");
            Some(Arc::new(provider) as Arc<dyn ReviewProvider>)
        }
        Err(e) => {
            warn!(error = %e, "starting without a provider");
            None
        }
    };
    AppState::new(provider, credential_configured)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: &Config) -> Result<(), RelayError> {
    let state = state_from_config(config);
    let app = build_router(state, config.server.body_limit_bytes);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!("relay listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(RelayError::Serve)?;

    info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "could not listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
