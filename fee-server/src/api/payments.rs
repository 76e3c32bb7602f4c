use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use shared::models::{
    AdjustmentCreate, GatewayCallback, PaymentOrder, PaymentOrderCreate, PaymentTransaction,
};

use crate::gateway;
use crate::services::payments::{self, CallbackOutcome};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

/// Signature check only; never touches the ledger
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
    Json(req): Json<VerifyRequest>,
) -> Json<VerifyResponse> {
    let verified = gateway::verify(
        &req.order_id,
        &req.payment_id,
        &req.signature,
        &state.gateway_secret,
    );
    if !verified {
        tracing::warn!(
            school_id,
            order_id = %req.order_id,
            payment_id = %req.payment_id,
            "Payment signature verification failed"
        );
    }
    Json(VerifyResponse { verified })
}

pub async fn gateway_callback(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
    Json(callback): Json<GatewayCallback>,
) -> ApiResult<CallbackOutcome> {
    let outcome = payments::record_callback(&state, school_id, callback).await?;
    Ok(Json(outcome))
}

pub async fn create_order(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
    Json(data): Json<PaymentOrderCreate>,
) -> ApiResult<PaymentOrder> {
    let order = payments::create_order(&state, school_id, data).await?;
    Ok(Json(order))
}

pub async fn create_adjustment(
    State(state): State<AppState>,
    Path((school_id, student_id)): Path<(i64, i64)>,
    Json(data): Json<AdjustmentCreate>,
) -> ApiResult<PaymentTransaction> {
    let tx = payments::record_adjustment(&state, school_id, student_id, data).await?;
    Ok(Json(tx))
}

pub async fn student_transactions(
    State(state): State<AppState>,
    Path((school_id, student_id)): Path<(i64, i64)>,
) -> ApiResult<Vec<PaymentTransaction>> {
    let txs = payments::student_transactions(&state, school_id, student_id).await?;
    Ok(Json(txs))
}

pub async fn component_transactions(
    State(state): State<AppState>,
    Path((school_id, id)): Path<(i64, i64)>,
) -> ApiResult<Vec<PaymentTransaction>> {
    let txs = payments::component_transactions(&state, school_id, id).await?;
    Ok(Json(txs))
}
