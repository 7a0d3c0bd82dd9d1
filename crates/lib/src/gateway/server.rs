//! Gateway HTTP server (single port).

use crate::config::{self, Config};
use crate::handler::{Outcome, Relay};
use crate::policy::Skip;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the gateway (config and the notification pipeline).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub relay: Relay,
}

/// Routes: `GET /` health, `POST /events` event intake.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/events", post(receive_event))
        .with_state(state)
}

/// Run the gateway server with the mail sender built from config; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let relay = Relay::from_config(&config)?;
    run_gateway_with_relay(config, relay).await
}

/// Run the gateway server with an already-built relay.
pub async fn run_gateway_with_relay(config: Config, relay: Relay) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        log::warn!(
            "gateway bound to non-loopback address {}; /events accepts unauthenticated posts",
            bind
        );
    }
    log::info!(
        "gateway: mail provider {}, sending from {}",
        relay.provider(),
        relay.from_address()
    );

    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let state = GatewayState {
        config: Arc::new(config),
        relay,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// In-flight requests finish before the server returns.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /events: 200 with the completion payload when sent or skipped, 502 when delivery failed.
async fn receive_event(
    State(state): State<GatewayState>,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    let outcome = match std::str::from_utf8(&body) {
        Ok(text) => state.relay.handle_json(text).await,
        Err(e) => {
            log::info!("gateway: event body is not UTF-8: {}", e);
            Ok(Outcome::Skipped(Skip::MalformedEnvelope(e.to_string())))
        }
    };
    match outcome {
        Ok(outcome) => (StatusCode::OK, Json(outcome.completion())),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "success": false, "error": e.to_string() })),
        ),
    }
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "mail": state.relay.provider(),
    }))
}
