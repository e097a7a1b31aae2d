//! # Health, Readiness & Metrics Server
//!
//! A small axum server that runs beside the poll loop.
//!
//! | Path | Response |
//! |------|----------|
//! | `GET /health` | `200 {"status":"healthy"}` |
//! | `GET /ready` | `200 {"status":"ready"}`, or `503 {"status":"not ready","reason":"missing configuration"}` |
//! | `GET /metrics` | Prometheus text exposition |
//!
//! [`HealthServer::shutdown`] stops accepting connections and gives in-flight requests a
//! bounded grace period.

use crate::config::ServerSettings;
use crate::metrics::OrderMetrics;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("serve: {0}")]
    Serve(#[source] std::io::Error),
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("server did not stop within {0:?}")]
    ShutdownTimeout(Duration),
}

/// Which required identities were established at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    pub queue_configured: bool,
    pub store_configured: bool,
}

impl Readiness {
    pub fn configured() -> Self {
        Self {
            queue_configured: true,
            store_configured: true,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.queue_configured && self.store_configured
    }
}

#[derive(Debug, Clone)]
pub struct ServerState {
    pub metrics: OrderMetrics,
    pub readiness: Readiness,
}

#[derive(Debug, Serialize)]
struct ProbeBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn health_handler() -> Json<ProbeBody> {
    Json(ProbeBody {
        status: "healthy",
        reason: None,
    })
}

async fn ready_handler(State(state): State<ServerState>) -> (StatusCode, Json<ProbeBody>) {
    if state.readiness.is_ready() {
        (
            StatusCode::OK,
            Json(ProbeBody {
                status: "ready",
                reason: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ProbeBody {
                status: "not ready",
                reason: Some("missing configuration"),
            }),
        )
    }
}

async fn metrics_handler(State(state): State<ServerState>) -> Response {
    match state.metrics.render() {
        Ok(body) => ([(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// A running server task.
pub struct HealthServer {
    local_addr: SocketAddr,
    stop: CancellationToken,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl HealthServer {
    /// Binds the listener and starts serving in a background task.
    pub async fn bind(settings: &ServerSettings, state: ServerState) -> Result<Self, ServerError> {
        let listener = tokio::net::TcpListener::bind(settings.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: settings.addr,
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: settings.addr,
            source,
        })?;

        info!(
            addr = %local_addr,
            health = "/health",
            ready = "/ready",
            metrics = "/metrics",
            "starting HTTP server for metrics and health checks"
        );

        let stop = CancellationToken::new();
        let signal = stop.clone();
        let handle = tokio::spawn(async move {
            axum::serve(listener, router(state))
                .with_graceful_shutdown(async move { signal.cancelled().await })
                .await
                .map_err(ServerError::Serve)
        });

        Ok(Self {
            local_addr,
            stop,
            handle,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting connections and waits up to `grace` for in-flight requests.
    ///
    /// On timeout the task is aborted and [`ServerError::ShutdownTimeout`] returned.
    pub async fn shutdown(self, grace: Duration) -> Result<(), ServerError> {
        self.stop.cancel();
        let mut handle = self.handle;
        match tokio::time::timeout(grace, &mut handle).await {
            Ok(joined) => joined?,
            Err(_) => {
                handle.abort();
                Err(ServerError::ShutdownTimeout(grace))
            }
        }
    }
}
