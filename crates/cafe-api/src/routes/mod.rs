//! API route handlers

pub mod fees;
pub mod health;
pub mod transactions;

use axum::{http::StatusCode, routing::get, Json, Router};
use renbridge::LifecycleError;

use crate::dto::ApiError;
use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(fees::router())
        .nest("/transactions", transactions::router())
        .route("/prompts", get(transactions::list_prompts))
        .with_state(state)
}

pub(crate) type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

pub(crate) fn lifecycle_error(e: LifecycleError) -> (StatusCode, Json<ApiError>) {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ApiError::new(e.error_code(), e.to_string())))
}
