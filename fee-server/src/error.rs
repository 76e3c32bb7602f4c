//! Service-layer error type
//!
//! `ServiceError` bridges store errors (`StoreError`), engine errors (`FeeError`)
//! and the API-layer error (`AppError`) so services and handlers can use `?`.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::StoreError;
use crate::fees::FeeError;

#[derive(Debug)]
pub enum ServiceError {
    /// Store failure (logged once here, mapped by kind)
    Store(StoreError),
    /// Engine invariant breach or malformed amount
    Fee(FeeError),
    /// Business-rule error with its final ErrorCode
    App(AppError),
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Invariant(fee) => ServiceError::Fee(fee),
            other => ServiceError::Store(other),
        }
    }
}

impl From<FeeError> for ServiceError {
    fn from(e: FeeError) -> Self {
        ServiceError::Fee(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<shared::models::AmountError> for ServiceError {
    fn from(e: shared::models::AmountError) -> Self {
        ServiceError::Fee(e.into())
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Fee(fee_err) => {
                tracing::warn!(error = %fee_err, "Fee invariant rejected");
                fee_err.into()
            }
            ServiceError::Store(StoreError::Unavailable(msg)) => {
                tracing::error!(error = %msg, "Store unavailable");
                AppError::store_unavailable()
            }
            ServiceError::Store(StoreError::Conflict(msg)) => {
                tracing::warn!(error = %msg, "Store conflict");
                AppError::with_message(ErrorCode::AlreadyExists, msg)
            }
            ServiceError::Store(StoreError::CorruptRecord(msg)) => {
                tracing::error!(error = %msg, "Corrupt store record");
                AppError::new(ErrorCode::StoreRecordCorrupt)
            }
            ServiceError::Store(StoreError::Invariant(fee_err)) => fee_err.into(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
