//! Hotel inventory library
//!
//! Ingests daily room availability from a channel manager, derives weekly
//! occupancy statistics and keeps dated snapshots for comparison.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::Router;
use chrono::Utc;
use http::HeaderValue;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
};
use utoipa::ToSchema;

/// Shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<db::DbPool>,
    pub config: Arc<config::AppConfig>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<db::DbPool>,
        config: config::AppConfig,
        source: Arc<dyn services::channel_manager::InventorySource>,
    ) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config, source);
        Self {
            db,
            config: Arc::new(config),
            services,
        }
    }
}

/// Envelope around every successful payload
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod envelope_tests {
    use super::*;

    #[tokio::test]
    async fn envelope_quotes_the_scoped_request_id() {
        let envelope = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("dash-77"),
            async { ApiResponse::success(vec![14.29, 85.71]) },
        )
        .await;

        assert!(envelope.success);
        assert_eq!(envelope.data, Some(vec![14.29, 85.71]));
        let meta = envelope.meta.expect("meta");
        assert_eq!(meta.request_id.as_deref(), Some("dash-77"));
        assert!(chrono::DateTime::parse_from_rfc3339(&meta.timestamp).is_ok());
    }

    #[test]
    fn envelope_outside_a_request_has_no_request_id() {
        let envelope = ApiResponse::success(1);
        assert!(envelope.meta.expect("meta").request_id.is_none());
    }
}

/// CORS policy from configuration; `None` when origins are required but missing
pub fn cors_layer(cfg: &config::AppConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        return Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
                .allow_credentials(cfg.cors_allow_credentials),
        );
    }
    if cfg.should_allow_permissive_cors() {
        ::tracing::info!(environment = %cfg.environment, "Permissive CORS, no origins configured");
        return Some(CorsLayer::permissive());
    }
    None
}

/// Full HTTP application: health, domain endpoints, Swagger UI and middleware
pub fn app_router(state: AppState, cors: CorsLayer) -> Router {
    Router::<AppState>::new()
        .merge(health::health_routes())
        .merge(handlers::api_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(cors)
        // outermost, so the trace span and error bodies see the id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
