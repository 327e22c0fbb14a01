//! Transaction routes
//!
//! Creation, listing and the user-triggered lifecycle steps of a conversion.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use cafe_core::{chain, Direction, TxHash};
use renbridge::{
    validate_target_address, CompletionOutcome, LifecycleError, RevertPrompt, TransactionRecord,
};
use uuid::Uuid;

use crate::dto::{
    ApiError, CheckResponse, CompleteMintRequest, CompleteMintResponse, CreateBurnRequest,
    CreateMintRequest, DestTxRequest, ListQuery, NewRecordMeta,
};
use crate::routes::{lifecycle_error, ApiResult};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_transactions))
        .route("/mint", post(create_mint))
        .route("/burn", post(create_burn))
        .route("/:id", get(get_transaction))
        .route("/:id/complete", post(complete_mint))
        .route("/:id/retry", post(retry))
        .route("/:id/dest-tx", post(record_dest_tx))
        .route("/:id/check", post(check_dest_tx))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message)))
}

fn not_found(id: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::not_found(format!("Transaction not found: {}", id))),
    )
}

fn load(state: &AppState, id: &str) -> Result<TransactionRecord, (StatusCode, Json<ApiError>)> {
    state.store().get(id).ok_or_else(|| not_found(id))
}

fn new_meta(state: &AppState) -> NewRecordMeta {
    let created_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default();
    NewRecordMeta {
        id: Uuid::new_v4().to_string(),
        network: state.network(),
        adapter_address: state.config().contracts().adapter.clone(),
        created_at,
    }
}

/// Random 32-byte nonce for the gateway
fn new_nonce() -> String {
    format!("0x{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn check_amount(amount: f64) -> Result<(), (StatusCode, Json<ApiError>)> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(bad_request(format!("Invalid amount: {}", amount)));
    }
    Ok(())
}

/// GET /transactions - Records for a network, newest first
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<TransactionRecord>> {
    let network = query.network.unwrap_or_else(|| state.network());
    Ok(Json(state.store().list(network)))
}

/// GET /transactions/:id
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<TransactionRecord> {
    load(&state, &id).map(Json)
}

/// POST /transactions/mint - Start a BTC -> WBTC conversion
async fn create_mint(
    State(state): State<AppState>,
    Json(request): Json<CreateMintRequest>,
) -> Result<(StatusCode, Json<TransactionRecord>), (StatusCode, Json<ApiError>)> {
    check_amount(request.amount)?;
    validate_target_address(chain::ETHEREUM, &request.dest_address, state.network())
        .map_err(bad_request)?;

    let record = request.into_record(new_meta(&state), new_nonce());
    state
        .lifecycle()
        .init_convert_to_ethereum(record.clone())
        .map_err(lifecycle_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /transactions/burn - Start a WBTC -> BTC conversion and submit it
async fn create_burn(
    State(state): State<AppState>,
    Json(request): Json<CreateBurnRequest>,
) -> Result<(StatusCode, Json<TransactionRecord>), (StatusCode, Json<ApiError>)> {
    check_amount(request.amount)?;
    validate_target_address(chain::BITCOIN, &request.dest_address, state.network())
        .map_err(bad_request)?;

    let record = request.into_record(new_meta(&state));
    let record = state
        .lifecycle()
        .init_convert_from_ethereum(record)
        .await
        .map_err(lifecycle_error)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /transactions/:id/complete - Submit a signed mint behind the rate guard
async fn complete_mint(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<CompleteMintRequest>>,
) -> ApiResult<CompleteMintResponse> {
    let record = load(&state, &id)?;
    let request = body.map(|Json(b)| b).unwrap_or_default();

    let outcome = state
        .lifecycle()
        .complete_convert_to_ethereum(&record, request.approve_swapped_asset, |prompt| {
            tracing::info!(id = %prompt.tx_id, rate = %prompt.exchange_rate, "Exchange rate below minimum");
        })
        .await
        .map_err(lifecycle_error)?;

    Ok(Json(match outcome {
        CompletionOutcome::Submitted { record, hash } => {
            state.clear_prompt(&id).await;
            CompleteMintResponse::Submitted { record, hash }
        }
        CompletionOutcome::Halted { record, prompt } => {
            state.set_prompt(prompt.clone()).await;
            CompleteMintResponse::Halted { record, prompt }
        }
    }))
}

/// POST /transactions/:id/retry - Clear the error flag; burns are resubmitted
async fn retry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<TransactionRecord> {
    let record = load(&state, &id)?;
    if !record.error {
        return Err(lifecycle_error(LifecycleError::NotRetryable { id }));
    }
    let lifecycle = state.lifecycle();
    let record = match record.direction {
        Direction::Burn => lifecycle.init_convert_from_ethereum(record).await,
        Direction::Mint => lifecycle.retry(&id),
    }
    .map_err(lifecycle_error)?;
    Ok(Json(record))
}

/// POST /transactions/:id/dest-tx - Attach a destination transaction hash
async fn record_dest_tx(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DestTxRequest>,
) -> ApiResult<TransactionRecord> {
    if request.hash.is_empty() {
        return Err(bad_request("Transaction hash cannot be empty"));
    }
    state
        .lifecycle()
        .record_dest_tx(&id, TxHash::new(request.hash))
        .map(Json)
        .map_err(lifecycle_error)
}

/// POST /transactions/:id/check - Poll a mint's destination transaction
async fn check_dest_tx(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<CheckResponse> {
    let record = load(&state, &id)?;
    let updated = state
        .lifecycle()
        .check_minting_tx(&record)
        .await
        .map_err(lifecycle_error)?;

    Ok(Json(match updated {
        Some(record) => CheckResponse {
            changed: true,
            record,
        },
        None => CheckResponse {
            changed: false,
            record,
        },
    }))
}

/// GET /prompts - Exchange-rate prompts waiting for an answer
pub async fn list_prompts(State(state): State<AppState>) -> Json<Vec<RevertPrompt>> {
    Json(state.prompts().await)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use axum::Router;
    use renbridge::{AwaitingLabel, RelayResponse, RelayUtxo};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::create_router;
    use crate::state::test_support::{test_state, test_state_with_submitter};

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn fetch(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn mint_body() -> Value {
        json!({
            "amount": 0.5,
            "destAddress": "0x742d35Cc6634C0532925a3b844Bc9e7595f2bD08",
            "localWeb3Address": "0xEA8b2fF0d7f546AFAeAE1771306736357dEFa434",
            "maxSlippage": 0.01,
            "minExchangeRate": 0.995
        })
    }

    /// Store a mint the relay has signed, as the machine listener would
    fn sign(state: &AppState, id: &str) {
        let record = state.store().get(id).unwrap();
        state
            .store()
            .update(TransactionRecord {
                source_tx_hash: Some("b4d2c7e1f0a9".into()),
                ren_signature: Some(format!("0x{}", "ab".repeat(65))),
                ren_response: Some(RelayResponse {
                    amount: 49_800_000,
                    nhash: format!("0x{}", "11".repeat(32)),
                    revert: None,
                    utxo: Some(RelayUtxo {
                        amount: 50_000_000,
                        tx_hash: "b4d2c7e1f0a9".into(),
                        v_out: 0,
                    }),
                }),
                awaiting: AwaitingLabel::EthInit,
                ..record
            })
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get_mint() {
        let state = test_state();
        let (status, created) =
            send(create_router(state.clone()), post_json("/transactions/mint", mint_body())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["type"], "mint");
        assert_eq!(created["sourceNetworkVersion"], "testnet");
        let nonce = created["params"]["nonce"].as_str().unwrap();
        assert_eq!(nonce.len(), 66);

        let id = created["id"].as_str().unwrap();
        let (status, fetched) =
            send(create_router(state.clone()), fetch(&format!("/transactions/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], id);

        let (_, list) = send(create_router(state.clone()), fetch("/transactions")).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        let (_, mainnet) =
            send(create_router(state), fetch("/transactions?network=mainnet")).await;
        assert!(mainnet.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_mint_rejects_bad_address() {
        let mut body = mint_body();
        body["destAddress"] = json!("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx");
        let (status, error) =
            send(create_router(test_state()), post_json("/transactions/mint", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "bad_request");
    }

    #[tokio::test]
    async fn test_create_burn_submits() {
        let body = json!({
            "amount": 0.25,
            "destAddress": "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            "localWeb3Address": "0xEA8b2fF0d7f546AFAeAE1771306736357dEFa434",
            "minSwapProceeds": 0.2475
        });
        let (status, created) =
            send(create_router(test_state()), post_json("/transactions/burn", body)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["awaiting"], "eth-settle");
        assert_eq!(created["sourceTxHash"], "0xfeed");
        assert_eq!(created["error"], false);
    }

    #[tokio::test]
    async fn test_retry_leaves_healthy_burn_alone() {
        let (state, submitter) = test_state_with_submitter();
        let body = json!({
            "amount": 0.25,
            "destAddress": "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            "localWeb3Address": "0xEA8b2fF0d7f546AFAeAE1771306736357dEFa434",
            "minSwapProceeds": 0.2475
        });
        let (_, created) =
            send(create_router(state.clone()), post_json("/transactions/burn", body)).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(*submitter.calls.lock().unwrap(), 1);

        let (status, error) = send(
            create_router(state.clone()),
            post_json(&format!("/transactions/{}/retry", id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["code"], "not_retryable");
        assert_eq!(*submitter.calls.lock().unwrap(), 1);
        assert_eq!(state.store().get(&id).unwrap().source_tx_hash.as_deref(), Some("0xfeed"));
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let (status, error) =
            send(create_router(test_state()), fetch("/transactions/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error["code"], "not_found");
    }

    #[tokio::test]
    async fn test_complete_unsigned_mint_conflicts() {
        let state = test_state();
        let (_, created) =
            send(create_router(state.clone()), post_json("/transactions/mint", mint_body())).await;
        let id = created["id"].as_str().unwrap();

        let (status, error) = send(
            create_router(state),
            post_json(&format!("/transactions/{}/complete", id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["code"], "not_signed");
    }

    #[tokio::test]
    async fn test_complete_halts_then_proceeds_on_approval() {
        let state = test_state();
        let (_, created) =
            send(create_router(state.clone()), post_json("/transactions/mint", mint_body())).await;
        let id = created["id"].as_str().unwrap().to_string();
        sign(&state, &id);

        // pool pays 0.99, below the 0.995 minimum
        let (status, halted) = send(
            create_router(state.clone()),
            post_json(&format!("/transactions/{}/complete", id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(halted["status"], "halted");
        assert_eq!(halted["prompt"]["exchangeRate"], "0.99000000");

        let (_, prompts) = send(create_router(state.clone()), fetch("/prompts")).await;
        assert_eq!(prompts.as_array().unwrap().len(), 1);

        let (status, submitted) = send(
            create_router(state.clone()),
            post_json(
                &format!("/transactions/{}/complete", id),
                json!({ "approveSwappedAsset": "WBTC" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(submitted["status"], "submitted");
        assert_eq!(submitted["hash"], "0xfeed");
        assert_eq!(submitted["record"]["awaiting"], "eth-settle");
        assert!(state.prompts().await.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_kept_when_approved_submission_fails() {
        let (state, submitter) = test_state_with_submitter();
        let (_, created) =
            send(create_router(state.clone()), post_json("/transactions/mint", mint_body())).await;
        let id = created["id"].as_str().unwrap().to_string();
        sign(&state, &id);

        let uri = format!("/transactions/{}/complete", id);
        let (_, halted) = send(create_router(state.clone()), post_json(&uri, json!({}))).await;
        assert_eq!(halted["status"], "halted");

        *submitter.fail.lock().unwrap() = true;
        let (status, error) = send(
            create_router(state.clone()),
            post_json(&uri, json!({ "approveSwappedAsset": "WBTC" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(error["code"], "submission_failed");
        assert_eq!(state.prompts().await.len(), 1);
        assert!(state.store().get(&id).unwrap().error);
    }

    #[tokio::test]
    async fn test_dest_tx_and_check() {
        let state = test_state();
        let (_, created) =
            send(create_router(state.clone()), post_json("/transactions/mint", mint_body())).await;
        let id = created["id"].as_str().unwrap().to_string();

        let (status, updated) = send(
            create_router(state.clone()),
            post_json(&format!("/transactions/{}/dest-tx", id), json!({ "hash": "0xabc" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["destTxHash"], "0xabc");

        // the test chain does not know the hash
        let (status, checked) = send(
            create_router(state.clone()),
            post_json(&format!("/transactions/{}/check", id), json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checked["changed"], true);
        assert_eq!(checked["record"]["error"], true);

        let (_, retried) = send(
            create_router(state),
            post_json(&format!("/transactions/{}/retry", id), json!({})),
        )
        .await;
        assert_eq!(retried["error"], false);
    }
}
