//! Unified error codes for the fee engine
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Fee errors
//! - 5xxx: Payment errors
//! - 6xxx: Student errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the dashboard frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Fee ====================
    /// Fee component not found
    FeeComponentNotFound = 4001,
    /// A numeric fee invariant does not hold
    InvariantViolation = 4002,
    /// Quarter split does not sum to the component amount
    QuarterSplitMismatch = 4003,
    /// Class already has an active standard fee
    DuplicateClassFee = 4004,
    /// Fee component is inactive
    FeeComponentInactive = 4005,
    /// Amount is malformed or out of range
    InvalidAmount = 4006,

    // ==================== 5xxx: Payment ====================
    /// Payment order not found
    PaymentOrderNotFound = 5001,
    /// Adjustment must reference a fee component
    AdjustmentRequiresComponent = 5002,
    /// Payment amount must be positive
    PaymentAmountNotPositive = 5003,

    // ==================== 6xxx: Student ====================
    /// Student not found
    StudentNotFound = 6001,

    // ==================== 9xxx: System ====================
    /// Fee or ledger store could not be reached
    StoreUnavailable = 9003,
    /// Store returned a record that cannot be interpreted
    StoreRecordCorrupt = 9004,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Fee
            ErrorCode::FeeComponentNotFound => "Fee component not found",
            ErrorCode::InvariantViolation => "Fee invariant violated",
            ErrorCode::QuarterSplitMismatch => "Quarter split does not sum to the fee amount",
            ErrorCode::DuplicateClassFee => "Class already has an active standard fee",
            ErrorCode::FeeComponentInactive => "Fee component is inactive",
            ErrorCode::InvalidAmount => "Invalid amount",

            // Payment
            ErrorCode::PaymentOrderNotFound => "Payment order not found",
            ErrorCode::AdjustmentRequiresComponent => {
                "Adjustment must reference a fee component"
            }
            ErrorCode::PaymentAmountNotPositive => "Payment amount must be positive",

            // Student
            ErrorCode::StudentNotFound => "Student not found",

            // System
            ErrorCode::StoreUnavailable => "Fee store is unavailable",
            ErrorCode::StoreRecordCorrupt => "Fee store returned an unreadable record",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Fee
            4001 => Ok(ErrorCode::FeeComponentNotFound),
            4002 => Ok(ErrorCode::InvariantViolation),
            4003 => Ok(ErrorCode::QuarterSplitMismatch),
            4004 => Ok(ErrorCode::DuplicateClassFee),
            4005 => Ok(ErrorCode::FeeComponentInactive),
            4006 => Ok(ErrorCode::InvalidAmount),

            // Payment
            5001 => Ok(ErrorCode::PaymentOrderNotFound),
            5002 => Ok(ErrorCode::AdjustmentRequiresComponent),
            5003 => Ok(ErrorCode::PaymentAmountNotPositive),

            // Student
            6001 => Ok(ErrorCode::StudentNotFound),

            // System
            9003 => Ok(ErrorCode::StoreUnavailable),
            9004 => Ok(ErrorCode::StoreRecordCorrupt),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
