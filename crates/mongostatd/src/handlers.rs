//! HTTP scrape endpoint.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use prometheus::{Encoder, Registry, TextEncoder};
use tower_http::compression::CompressionLayer;
use tracing::error;

#[derive(Clone)]
struct AppState {
    registry: Registry,
    metrics_path: Arc<str>,
}

/// Builds the router serving `/` and the metrics route.
pub(crate) fn router(registry: Registry, metrics_path: &str) -> Router {
    let state = AppState {
        registry,
        metrics_path: Arc::from(metrics_path),
    };
    Router::new()
        .route("/", get(index))
        .route(metrics_path, get(metrics))
        .layer(CompressionLayer::new())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html><head><title>mongostatd</title></head><body>\
         <h1>mongostatd {}</h1><p><a href=\"{}\">Metrics</a></p>\
         </body></html>",
        mongostat_core::VERSION,
        state.metrics_path
    ))
}

async fn metrics(State(state): State<AppState>) -> Response {
    let encoder = TextEncoder::new();
    let families = state.registry.gather();
    let mut buffer = Vec::new();
    match encoder.encode(&families, &mut buffer) {
        Ok(()) => (
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
