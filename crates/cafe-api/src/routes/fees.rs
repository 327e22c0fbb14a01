//! Relay fee and quote routes

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use renbridge::{quote, CalcError, FeeError, FeeQuote};

use crate::dto::{ApiError, FeesResponse, QuoteRequest};
use crate::routes::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/fees", get(get_fees))
        .route("/fees/refresh", post(refresh_fees))
        .route("/quote", post(get_quote))
}

fn fee_error(e: FeeError) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ApiError::new("fees_unavailable", e.to_string())),
    )
}

/// GET /fees - Current relay fees (fetched on first use)
async fn get_fees(State(state): State<AppState>) -> ApiResult<FeesResponse> {
    let fees = state.fees().fees().await.map_err(fee_error)?;
    Ok(Json(fees.into()))
}

/// POST /fees/refresh - Re-fetch relay fees
async fn refresh_fees(State(state): State<AppState>) -> ApiResult<FeesResponse> {
    let fees = state.fees().refresh().await.map_err(fee_error)?;
    Ok(Json(fees.into()))
}

/// POST /quote - Fees and expected output for an amount
async fn get_quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> ApiResult<FeeQuote> {
    let fees = state.fees().fees().await.map_err(fee_error)?;

    let quote = quote(request.amount, request.direction, &fees, state.pool())
        .await
        .map_err(|e| match e {
            CalcError::InvalidAmount(_) => (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new("invalid_amount", e.to_string())),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal(other.to_string())),
            ),
        })?;

    quote.map(Json).ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiError::new("quote_unavailable", "Pool quote failed")),
        )
    })
}
