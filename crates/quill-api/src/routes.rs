//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::{Extension, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use quill_models::ComputeKind;

use crate::handlers::{
    health, job_status, job_status_by_body, queue_status, ready, submit_batch, submit_job,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Submit and poll routes for one compute kind, nested at `/api/{kind}`.
fn job_routes(kind: ComputeKind) -> Router<AppState> {
    let mut router = Router::new()
        .route("/", post(submit_job))
        .route("/status", post(job_status_by_body))
        .route("/status/:key", get(job_status));

    if kind == ComputeKind::Alignment {
        router = router.route("/batch", post(submit_batch));
    }

    router.layer(Extension(kind))
}

/// Create the application router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = ComputeKind::ALL
        .iter()
        .fold(Router::new(), |router, kind| {
            router.nest(&format!("/{}", kind.as_str()), job_routes(*kind))
        })
        .route("/queue/status", get(queue_status));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
