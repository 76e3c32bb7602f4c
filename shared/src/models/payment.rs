//! Payment transaction and payment order models

use serde::{Deserialize, Serialize};

use super::amount::{Amount, AmountInput};

/// Method recorded for gateway-confirmed payments
pub const METHOD_ONLINE: &str = "online";
/// Method recorded for administrative corrections
pub const METHOD_ADJUSTMENT: &str = "adjustment";

/// Immutable payment record; corrections are new transactions, never edits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: i64,
    pub student_id: i64,
    /// `None` when the payment applies to the whole fee set
    pub fee_component_ref: Option<i64>,
    /// Negative for corrective adjustments
    pub amount: Amount,
    pub method: String,
    pub reference_no: String,
    /// Gateway order id (unique together with `payment_id`)
    pub order_id: Option<String>,
    /// Gateway payment id
    pub payment_id: Option<String>,
    pub note: Option<String>,
    pub verified: bool,
    pub timestamp: i64,
}

/// Server-side record of a checkout the gateway was asked to collect
///
/// The amount recorded on callback comes from here, never from the callback body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    pub order_id: String,
    pub student_id: i64,
    pub fee_component_ref: Option<i64>,
    pub amount: Amount,
    pub created_at: i64,
}

/// Create payment order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrderCreate {
    pub student_id: i64,
    pub fee_component_id: Option<i64>,
    pub amount: AmountInput,
}

/// Gateway checkout callback (untrusted until verified)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayCallback {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub method: Option<String>,
}

/// Administrative correction payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentCreate {
    pub fee_component_id: Option<i64>,
    pub amount: AmountInput,
    pub reference_no: String,
    pub note: Option<String>,
}
