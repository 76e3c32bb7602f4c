//! Orchestration between the stores, the engine and the verifier
//!
//! Handlers stay thin: they parse input, call one function here and wrap the
//! result. Everything here takes an explicit `school_id`.

pub mod fees;
pub mod payments;

use shared::error::{AppError, ErrorCode};
use shared::models::StudentRef;

use crate::db::FeeComponentStore;
use crate::error::ServiceResult;

/// Resolve a student's class and section, or `StudentNotFound`
pub async fn load_student(
    store: &dyn FeeComponentStore,
    school_id: i64,
    student_id: i64,
) -> ServiceResult<StudentRef> {
    store
        .find_student(school_id, student_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::StudentNotFound,
                format!("Student {student_id} not found"),
            )
            .into()
        })
}
