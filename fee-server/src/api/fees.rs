use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::error::AppError;
use shared::models::{FeeComponent, FeeComponentCreate};
use shared::util::today;

use crate::fees::summary::{ClassSummary, SummaryFilter};
use crate::services::fees::{self, FeeBreakdown};
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, AppError>;

#[derive(Debug, Deserialize)]
pub struct BreakdownQuery {
    /// Date used for service validity windows; defaults to the current UTC date
    pub today: Option<NaiveDate>,
}

pub async fn fee_breakdown(
    State(state): State<AppState>,
    Path((school_id, student_id)): Path<(i64, i64)>,
    Query(query): Query<BreakdownQuery>,
) -> ApiResult<FeeBreakdown> {
    let date = query.today.unwrap_or_else(today);
    let breakdown = fees::fee_breakdown(&state, school_id, student_id, date).await?;
    Ok(Json(breakdown))
}

pub async fn class_summary(
    State(state): State<AppState>,
    Path((school_id, class_id)): Path<(i64, i64)>,
    Query(filter): Query<SummaryFilter>,
) -> ApiResult<ClassSummary> {
    let summary = fees::class_summary(&state, school_id, class_id, &filter, today()).await?;
    Ok(Json(summary))
}

pub async fn create_component(
    State(state): State<AppState>,
    Path(school_id): Path<i64>,
    Json(data): Json<FeeComponentCreate>,
) -> ApiResult<FeeComponent> {
    let component = fees::create_component(&state, school_id, data).await?;
    Ok(Json(component))
}

pub async fn deactivate_component(
    State(state): State<AppState>,
    Path((school_id, id)): Path<(i64, i64)>,
) -> ApiResult<FeeComponent> {
    let component = fees::deactivate_component(&state, school_id, id).await?;
    Ok(Json(component))
}

pub async fn reactivate_component(
    State(state): State<AppState>,
    Path((school_id, id)): Path<(i64, i64)>,
) -> ApiResult<FeeComponent> {
    let component = fees::reactivate_component(&state, school_id, id).await?;
    Ok(Json(component))
}
