use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::Serialize;
use tokio::signal;
use tokio::task::JoinError;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zipfill::{LookupResponse, lookup_zipcode, normalize_lookup_code};

const DEFAULT_PORT: u16 = 3000;

/// `HOST` and `PORT` from the environment, listening on all interfaces
/// port 3000 when unset or unparsable.
fn listen_addr() -> SocketAddr {
    let host = env::var("HOST")
        .ok()
        .and_then(|h| h.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    SocketAddr::new(host, port)
}

/// Counters for `/api/zip` traffic
#[derive(Default)]
struct LookupStats {
    served: AtomicU64,
    in_flight: AtomicU64,
    unmatched: AtomicU64,
}

/// Marks one lookup in flight until dropped
struct InFlight<'a>(&'a LookupStats);

impl<'a> InFlight<'a> {
    fn start(stats: &'a LookupStats) -> Self {
        stats.served.fetch_add(1, Ordering::Relaxed);
        stats.in_flight.fetch_add(1, Ordering::Relaxed);
        Self(stats)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Clone)]
struct AppState {
    stats: Arc<LookupStats>,
    started: Instant,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Zip lookup server listening on {}", addr);

    axum::serve(listener, build_app())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Zip lookup server stopped");
    Ok(())
}

fn build_app() -> Router {
    let state = AppState {
        stats: Arc::new(LookupStats::default()),
        started: Instant::now(),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/api/zip/:code", get(zip_lookup))
        .route("/api/metrics", get(lookup_metrics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Every locality for a zip code. Unknown codes give an empty list, not 404.
async fn zip_lookup(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<LookupResponse>, LookupFailed> {
    let _in_flight = InFlight::start(&state.stats);

    let zip_code = normalize_lookup_code(&raw);

    // The bundled database scan is synchronous.
    let lookup_code = zip_code.clone();
    let results = tokio::task::spawn_blocking(move || lookup_zipcode(&lookup_code))
        .await
        .map_err(|source| LookupFailed {
            zip_code: zip_code.clone(),
            source,
        })?;

    if results.is_empty() {
        state.stats.unmatched.fetch_add(1, Ordering::Relaxed);
    }
    tracing::info!(zip = %zip_code, matches = results.len(), "Zip lookup");

    Ok(Json(LookupResponse {
        zip_code: Some(zip_code),
        results,
    }))
}

#[derive(Serialize)]
struct MetricsResponse {
    lookups_served: u64,
    lookups_in_flight: u64,
    lookups_unmatched: u64,
    uptime_seconds: u64,
}

async fn lookup_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let stats = &state.stats;
    Json(MetricsResponse {
        lookups_served: stats.served.load(Ordering::Relaxed),
        lookups_in_flight: stats.in_flight.load(Ordering::Relaxed),
        lookups_unmatched: stats.unmatched.load(Ordering::Relaxed),
        uptime_seconds: state.started.elapsed().as_secs(),
    })
}

/// The database scan task died before answering
struct LookupFailed {
    zip_code: String,
    source: JoinError,
}

impl IntoResponse for LookupFailed {
    fn into_response(self) -> Response {
        tracing::error!(zip = %self.zip_code, error = %self.source, "Zip lookup task failed");
        let body = Json(serde_json::json!({
            "zip_code": self.zip_code,
            "error": "lookup failed",
        }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Resolves on Ctrl+C or, on unix, SIGTERM
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Cannot listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Cannot listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => tracing::info!("Interrupted, draining connections"),
        _ = terminate => tracing::info!("Terminated, draining connections"),
    }
}
