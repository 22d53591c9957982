//! HTTP front end for the pipeline.
//!
//! - `GET /health`: status, journal count, degraded flag
//! - `POST /search`: JSON [`SearchCriteria`] in, result envelope out

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::PipelineError;
use crate::formatters::{format_results_markdown, results_envelope};
use crate::models::SearchCriteria;
use crate::pipeline::Pipeline;

/// Build the router over a shared pipeline.
pub fn create_router(pipeline: Pipeline) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/search", post(handle_search))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(pipeline)
}

/// Serve until Ctrl-C.
///
/// # Errors
///
/// Returns error if the port cannot be bound or the server fails.
pub async fn serve(pipeline: Pipeline, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        journals = pipeline.index().len(),
        degraded = pipeline.is_degraded(),
        "HTTP server listening"
    );

    axum::serve(listener, create_router(pipeline)).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("HTTP server shut down");
    Ok(())
}

async fn health_check(State(pipeline): State<Pipeline>) -> impl IntoResponse {
    Json(json!({
        "status": if pipeline.is_degraded() { "degraded" } else { "ok" },
        "service": "pubmed-topjournals",
        "version": env!("CARGO_PKG_VERSION"),
        "journals": pipeline.index().len(),
        "degraded": pipeline.is_degraded(),
    }))
}

async fn handle_search(
    State(pipeline): State<Pipeline>,
    Json(criteria): Json<SearchCriteria>,
) -> Response {
    match pipeline.run(&criteria).await {
        Ok(result) => {
            let mut body = results_envelope(&result);
            body["markdown"] = json!(format_results_markdown(&criteria.query, &result));
            Json(body).into_response()
        }
        Err(err) => ApiError(err).into_response(),
    }
}

/// HTTP status for a pipeline failure.
#[must_use]
pub const fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::InvalidCriteria { .. } | PipelineError::MalformedQuery { .. } => {
            StatusCode::BAD_REQUEST
        }
        PipelineError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
        PipelineError::Network(_) | PipelineError::Rejected(_) => StatusCode::BAD_GATEWAY,
        PipelineError::MetricsUnavailable | PipelineError::DataLoad(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

const fn error_kind(err: &PipelineError) -> &'static str {
    match err {
        PipelineError::InvalidCriteria { .. } => "invalid_criteria",
        PipelineError::Network(_) => "network",
        PipelineError::RateLimited(_) => "rate_limited",
        PipelineError::MalformedQuery { .. } => "malformed_query",
        PipelineError::Rejected(_) => "rejected",
        PipelineError::MetricsUnavailable => "metrics_unavailable",
        PipelineError::DataLoad(_) => "data_load",
    }
}

struct ApiError(PipelineError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::warn!(error = %self.0, status = status.as_u16(), "Search failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Search rejected");
        }

        let body = json!({
            "error": {
                "kind": error_kind(&self.0),
                "message": self.0.to_user_message(),
                "detail": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal");
}
