//! Payment orders, gateway callbacks and administrative adjustments
//!
//! The only writer of the ledger. Every write is an append; nothing is
//! updated or deleted in place.

use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AdjustmentCreate, FeeSet, GatewayCallback, METHOD_ADJUSTMENT, METHOD_ONLINE, PaymentOrder,
    PaymentOrderCreate, PaymentTransaction,
};
use shared::util::{now_millis, snowflake_id, today};

use super::load_student;
use crate::db::AppendOutcome;
use crate::error::ServiceResult;
use crate::fees::aggregate;
use crate::gateway;
use crate::state::AppState;

/// Result of processing a gateway callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackOutcome {
    pub verified: bool,
    /// The `(order_id, payment_id)` pair had already been recorded
    pub duplicate: bool,
    pub transaction: Option<PaymentTransaction>,
}

impl CallbackOutcome {
    fn rejected() -> Self {
        Self {
            verified: false,
            duplicate: false,
            transaction: None,
        }
    }
}

/// Require `component_id` to be an active member of the student's fee set
async fn check_target(
    state: &AppState,
    school_id: i64,
    fee_set: &FeeSet,
    component_id: i64,
) -> ServiceResult<()> {
    if fee_set.component(component_id).is_some() {
        return Ok(());
    }
    let code = match state.fees.find_component(school_id, component_id).await? {
        Some(c) if !c.active => ErrorCode::FeeComponentInactive,
        _ => ErrorCode::FeeComponentNotFound,
    };
    Err(AppError::with_message(
        code,
        format!(
            "Fee component {component_id} is not payable for student {}",
            fee_set.student_id
        ),
    )
    .into())
}

async fn current_fee_set(state: &AppState, school_id: i64, student_id: i64) -> ServiceResult<FeeSet> {
    let student = load_student(state.fees.as_ref(), school_id, student_id).await?;
    aggregate::aggregate(state.fees.as_ref(), school_id, &student, today()).await
}

/// Record the checkout the gateway will be asked to collect
pub async fn create_order(
    state: &AppState,
    school_id: i64,
    req: PaymentOrderCreate,
) -> ServiceResult<PaymentOrder> {
    let amount = req.amount.into_amount()?;
    if !amount.is_positive() {
        return Err(AppError::new(ErrorCode::PaymentAmountNotPositive).into());
    }
    let fee_set = current_fee_set(state, school_id, req.student_id).await?;
    if let Some(component_id) = req.fee_component_id {
        check_target(state, school_id, &fee_set, component_id).await?;
    }

    let order = PaymentOrder {
        order_id: format!("order_{}", uuid::Uuid::new_v4().simple()),
        student_id: req.student_id,
        fee_component_ref: req.fee_component_id,
        amount,
        created_at: now_millis(),
    };
    state.ledger.insert_order(school_id, &order).await?;
    tracing::info!(
        school_id,
        student_id = order.student_id,
        order_id = %order.order_id,
        amount = %order.amount,
        "Payment order created"
    );
    Ok(order)
}

/// Verify a callback and, if authentic, append exactly one verified transaction
///
/// A failed verification is an ordinary outcome, not an error. The amount
/// recorded is the order's, never anything in the callback body.
pub async fn record_callback(
    state: &AppState,
    school_id: i64,
    callback: GatewayCallback,
) -> ServiceResult<CallbackOutcome> {
    if !gateway::verify(
        &callback.order_id,
        &callback.payment_id,
        &callback.signature,
        &state.gateway_secret,
    ) {
        tracing::warn!(
            school_id,
            order_id = %callback.order_id,
            payment_id = %callback.payment_id,
            "Gateway callback failed verification"
        );
        return Ok(CallbackOutcome::rejected());
    }

    let order = state
        .ledger
        .find_order(school_id, &callback.order_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::PaymentOrderNotFound,
                format!("Payment order {} not found", callback.order_id),
            )
        })?;

    let tx = PaymentTransaction {
        id: snowflake_id(),
        student_id: order.student_id,
        fee_component_ref: order.fee_component_ref,
        amount: order.amount,
        method: callback
            .method
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| METHOD_ONLINE.to_string()),
        reference_no: callback.payment_id.clone(),
        order_id: Some(callback.order_id),
        payment_id: Some(callback.payment_id),
        note: None,
        verified: true,
        timestamp: now_millis(),
    };

    match state.ledger.append_transaction(school_id, &tx).await? {
        AppendOutcome::Inserted => {
            tracing::info!(
                school_id,
                student_id = tx.student_id,
                order_id = ?tx.order_id,
                amount = %tx.amount,
                "Verified payment recorded"
            );
            Ok(CallbackOutcome {
                verified: true,
                duplicate: false,
                transaction: Some(tx),
            })
        }
        AppendOutcome::Duplicate(existing) => {
            tracing::info!(
                school_id,
                order_id = ?existing.order_id,
                payment_id = ?existing.payment_id,
                "Replayed gateway callback ignored"
            );
            Ok(CallbackOutcome {
                verified: true,
                duplicate: true,
                transaction: Some(existing),
            })
        }
    }
}

/// Corrective entry against one component; may be negative, never zero
pub async fn record_adjustment(
    state: &AppState,
    school_id: i64,
    student_id: i64,
    req: AdjustmentCreate,
) -> ServiceResult<PaymentTransaction> {
    let component_id = req
        .fee_component_id
        .ok_or_else(|| AppError::new(ErrorCode::AdjustmentRequiresComponent))?;
    let amount = req.amount.into_amount()?;
    if amount.is_zero() {
        return Err(
            AppError::with_message(ErrorCode::InvalidAmount, "adjustment must not be zero").into(),
        );
    }
    let reference_no = req.reference_no.trim().to_string();
    if reference_no.is_empty() {
        return Err(
            AppError::with_message(ErrorCode::RequiredField, "reference_no is required").into(),
        );
    }

    let fee_set = current_fee_set(state, school_id, student_id).await?;
    check_target(state, school_id, &fee_set, component_id).await?;

    let tx = PaymentTransaction {
        id: snowflake_id(),
        student_id,
        fee_component_ref: Some(component_id),
        amount,
        method: METHOD_ADJUSTMENT.to_string(),
        reference_no,
        order_id: None,
        payment_id: None,
        note: req.note,
        verified: true,
        timestamp: now_millis(),
    };
    state.ledger.append_transaction(school_id, &tx).await?;
    tracing::info!(
        school_id,
        student_id,
        component_id,
        amount = %tx.amount,
        "Adjustment recorded"
    );
    Ok(tx)
}

/// Audit list for a student: verified and unverified
pub async fn student_transactions(
    state: &AppState,
    school_id: i64,
    student_id: i64,
) -> ServiceResult<Vec<PaymentTransaction>> {
    load_student(state.fees.as_ref(), school_id, student_id).await?;
    Ok(state
        .ledger
        .transactions_for_student(school_id, student_id)
        .await?)
}

pub async fn component_transactions(
    state: &AppState,
    school_id: i64,
    component_id: i64,
) -> ServiceResult<Vec<PaymentTransaction>> {
    if state
        .fees
        .find_component(school_id, component_id)
        .await?
        .is_none()
    {
        return Err(AppError::with_message(
            ErrorCode::FeeComponentNotFound,
            format!("Fee component {component_id} not found"),
        )
        .into());
    }
    Ok(state
        .ledger
        .transactions_for_component(school_id, component_id)
        .await?)
}
