//! Unified error system for the fee engine
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ErrorBody`]: JSON body of every error response
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 4xxx: Fee errors
//! - 5xxx: Payment errors
//! - 6xxx: Student errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorBody, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::StudentNotFound);
//!
//! let err = AppError::with_message(ErrorCode::QuarterSplitMismatch, "q1..q4 sum to 11999")
//!     .with_detail("expected", 12000);
//!
//! let body = ErrorBody::from(&err);
//! assert_eq!(body.code, 4003);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, ErrorBody};
