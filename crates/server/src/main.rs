//! HTTP trigger surface for the simplification pipeline.
//!
//! `POST /simplify` accepts a document plus optional configuration
//! overrides, runs the full pipeline, and answers only once the run has
//! completed or failed outright. Each request gets its own pipeline context,
//! so concurrent requests never share a generation session.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lenio_core::{
    HttpGenerator, HttpGeneratorConfig, LenioError, ReadingLevel, SimplifyConfig, Simplifier,
};

/// Shared server state: where the generation service lives.
struct AppState {
    generator_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SimplifyRequest {
    /// The document to simplify.
    html: String,
    /// Reading level 1-4; defaults to the everyday level.
    reading_level: Option<u8>,
    /// Estimated-token budget per chunk.
    token_budget: Option<f64>,
    /// Retry ceiling per chunk.
    max_attempts: Option<usize>,
}

#[derive(Debug, Serialize)]
struct SimplifyResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    chunks_total: usize,
    chunks_rewritten: usize,
    chunks_failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
}

impl SimplifyResponse {
    fn failure(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
            chunks_total: 0,
            chunks_rewritten: 0,
            chunks_failed: 0,
            html: None,
        }
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn simplify(
    State(state): State<Arc<AppState>>, Json(request): Json<SimplifyRequest>,
) -> (StatusCode, Json<SimplifyResponse>) {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("simplify", %request_id);

    async move {
        let mut builder = SimplifyConfig::builder();

        if let Some(score) = request.reading_level {
            match ReadingLevel::from_score(score) {
                Some(level) => builder = builder.reading_level(level),
                None => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(SimplifyResponse::failure(format!(
                            "invalid reading level: {} (expected 1-4)",
                            score
                        ))),
                    );
                }
            }
        }
        if let Some(budget) = request.token_budget {
            builder = builder.token_budget(budget);
        }
        if let Some(attempts) = request.max_attempts {
            builder = builder.max_attempts(attempts);
        }

        let generator_config =
            HttpGeneratorConfig { endpoint: state.generator_endpoint.clone(), ..Default::default() };
        let generator = match HttpGenerator::new(generator_config) {
            Ok(generator) => generator,
            Err(err) => {
                tracing::error!(error = %err, "failed to build generation backend");
                return (StatusCode::BAD_GATEWAY, Json(SimplifyResponse::failure(err.to_string())));
            }
        };

        let simplifier = Simplifier::new(generator, builder.build());
        match simplifier.run(&request.html).await {
            Ok(report) => {
                let outcome = report.outcome;
                tracing::info!(
                    chunks = outcome.total_chunks,
                    rewritten = outcome.rewritten,
                    failed = outcome.failed,
                    "simplify request complete"
                );
                (
                    StatusCode::OK,
                    Json(SimplifyResponse {
                        success: true,
                        error: None,
                        chunks_total: outcome.total_chunks,
                        chunks_rewritten: outcome.rewritten,
                        chunks_failed: outcome.failed,
                        html: Some(report.html),
                    }),
                )
            }
            Err(err) => {
                let status = match &err {
                    LenioError::NoContent => StatusCode::UNPROCESSABLE_ENTITY,
                    LenioError::CapabilityUnavailable => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                tracing::warn!(error = %err, "simplify request failed");
                (status, Json(SimplifyResponse::failure(err.to_string())))
            }
        }
    }
    .instrument(span)
    .await
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/simplify", post(simplify))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(600)))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let generator_endpoint =
        std::env::var("LENIO_GENERATOR_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:8787".to_string());
    let listen = std::env::var("LENIO_LISTEN").unwrap_or_else(|_| "127.0.0.1:8788".to_string());

    let addr: SocketAddr = match listen.parse() {
        Ok(addr) => addr,
        Err(err) => {
            tracing::error!(listen, error = %err, "invalid listen address");
            return;
        }
    };

    let state = Arc::new(AppState { generator_endpoint });
    let app = router(state);

    tracing::info!(%addr, "lenio-server listening");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind");
            return;
        }
    };

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!(error = %err, "server exited with error");
    }
}
