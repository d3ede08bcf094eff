//! Stockroom API Library
//!
//! Core services and HTTP surface for the stockroom change approval dashboard
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod notifications;
pub mod openapi;
pub mod request_id;
pub mod services;
pub mod validation;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub change_requests: services::ChangeRequestService,
    pub inventory: services::InventoryService,
    pub reconciliation: services::ReconciliationService,
}

impl AppState {
    /// Wires the full service stack over one database handle.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
        notifier: Arc<dyn notifications::Notifier>,
    ) -> Self {
        let applier = services::InventoryApplyService::new(db.clone());
        let change_requests = services::ChangeRequestService::new(
            db.clone(),
            applier,
            notifier,
            event_sender.clone(),
        );
        let inventory = services::InventoryService::new(db.clone());
        let reconciliation =
            services::ReconciliationService::new(db.clone(), event_sender.clone());

        Self {
            db,
            config,
            event_sender,
            change_requests,
            inventory,
            reconciliation,
        }
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            message: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Every route the dashboard talks to, mounted under `/api/v1` by the binary.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(handlers::pending_changes::routes())
        .merge(handlers::reconciliation::routes())
        .merge(handlers::inventory::routes())
}

/// Router used when no storage backend is configured. Every API route
/// answers 503 with the standard envelope so the dashboard sees a
/// consistent error instead of connection failures.
pub fn unconfigured_router() -> Router {
    Router::new().nest("/api/v1", Router::new().fallback(storage_unconfigured))
}

async fn storage_unconfigured() -> errors::ServiceError {
    errors::ServiceError::ServiceUnavailable(
        "Database is not configured; set APP__DATABASE_URL".to_string(),
    )
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "service": "stockroom-api",
        "environment": state.config.environment,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
