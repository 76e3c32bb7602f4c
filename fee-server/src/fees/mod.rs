//! Fee aggregation and payment reconciliation engine
//!
//! Everything in here is a pure function over already-fetched data except
//! [`aggregate::aggregate`], which reads through the [`crate::db::FeeComponentStore`]
//! interface. Nothing in this module writes to a store.
//!
//! - [`quarter`]: divide an annual amount into four installments
//! - [`aggregate`]: merge fee sources into one [`shared::models::FeeSet`]
//! - [`ledger`]: fold payment transactions over a fee set
//! - [`status`]: paid / partial / pending classification and roll-ups
//! - [`summary`]: class × section × quarter aggregation

pub mod aggregate;
pub mod ledger;
pub mod quarter;
pub mod status;
pub mod summary;

use shared::error::{AppError, ErrorCode};
use shared::models::{Amount, AmountError};
use thiserror::Error;

/// Engine errors
///
/// Every variant except `InvalidAmount`, `SplitOverflow` and `InvalidQuarter`
/// is an invariant violation: surfaced to the caller, never corrected here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("quarter split sums to {split}, expected {total}")]
    SplitMismatch { total: Amount, split: Amount },

    #[error("{what} must not be negative, got {amount}")]
    NegativeAmount { what: &'static str, amount: Amount },

    #[error("quarter installments overflow the amount range")]
    SplitOverflow,

    #[error("custom quarter policy requires four quarter amounts")]
    MissingCustomSplit,

    #[error("class {class_id} has {count} active standard fees")]
    DuplicateClassFee { class_id: i64, count: usize },

    #[error("fee component {component_id} has an incomplete set of quarter fields")]
    IncompleteQuarterFields { component_id: i64 },

    #[error("untargeted payments net to {0}, which cannot be allocated")]
    NegativeUnallocated(Amount),

    #[error("quarter must be between 1 and 4, got {0}")]
    InvalidQuarter(u8),

    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
}

impl FeeError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::SplitMismatch { .. } | Self::MissingCustomSplit => {
                ErrorCode::QuarterSplitMismatch
            }
            Self::DuplicateClassFee { .. } => ErrorCode::DuplicateClassFee,
            Self::NegativeAmount { .. }
            | Self::IncompleteQuarterFields { .. }
            | Self::NegativeUnallocated(_) => ErrorCode::InvariantViolation,
            Self::InvalidQuarter(_) => ErrorCode::ValueOutOfRange,
            Self::InvalidAmount(_) | Self::SplitOverflow => ErrorCode::InvalidAmount,
        }
    }
}

impl From<FeeError> for AppError {
    fn from(e: FeeError) -> Self {
        AppError::with_message(e.error_code(), e.to_string())
    }
}
