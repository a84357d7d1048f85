pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Json, Router,
};
use service_core::error::AppError;
use service_core::middleware::tracing::request_id_middleware;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServiceConfig;
use crate::services::{InvoiceStore, JwtService, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: ServiceConfig,
    pub store: Arc<dyn InvoiceStore>,
    pub users: Arc<dyn UserStore>,
    pub jwt: JwtService,
}

pub fn build_router(state: AppState) -> Result<Router, AppError> {
    // Every invoice route sits behind the auth gate; there is no
    // per-operation authorization beyond it.
    let invoice_routes = Router::new()
        .route(
            "/api/invoices",
            get(handlers::invoices::list_invoices).post(handlers::invoices::create_invoice),
        )
        .route(
            "/api/invoices/:id",
            get(handlers::invoices::get_invoice)
                .put(handlers::invoices::update_invoice)
                .delete(handlers::invoices::delete_invoice),
        )
        .layer(from_fn_with_state(
            state.jwt.clone(),
            middleware::auth_middleware,
        ));

    let cors = build_cors(&state.config)?;

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route("/api/auth/login", post(handlers::auth::login))
        .merge(invoice_routes)
        .with_state(state)
        // Add metrics middleware
        .layer(from_fn(middleware::metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        // Add CORS layer
        .layer(cors);

    Ok(app)
}

fn build_cors(config: &ServiceConfig) -> Result<CorsLayer, AppError> {
    let origins = config
        .security
        .allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| AppError::Config(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Service health check: liveness plus a store connectivity probe.
pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Store health check failed");
        e
    })?;

    Ok(Json(serde_json::json!({
        "status": "ok",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "checks": {
            "store": "up"
        }
    })))
}
