use axum::{Json, extract::Path};
use serde::Deserialize;
use shared::error::AppError;
use shared::models::{AmountInput, QuarterSplit, SplitPolicy};

use crate::fees::{FeeError, quarter};

#[derive(Debug, Deserialize)]
pub struct QuarterSplitRequest {
    pub amount: AmountInput,
    pub policy: SplitPolicy,
    pub custom: Option<[AmountInput; 4]>,
}

/// Stateless; the school segment only keeps the route shape uniform
pub async fn quarter_split(
    Path(_school_id): Path<i64>,
    Json(req): Json<QuarterSplitRequest>,
) -> Result<Json<QuarterSplit>, AppError> {
    let total = req.amount.into_amount().map_err(FeeError::from)?;
    let custom = quarter::parse_inputs(req.custom)?;
    let split = quarter::split(total, req.policy, custom)?;
    Ok(Json(split))
}
