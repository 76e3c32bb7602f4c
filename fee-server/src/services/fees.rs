//! Fee breakdown, class summary and fee component administration

use chrono::NaiveDate;
use serde::Serialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    FeeComponent, FeeComponentCreate, FeeScope, FeeSet, FeeSource, Ledger,
    LedgerSummary, QuarterEntry, QuarterSplit, StudentRef,
};
use shared::util::{now_millis, snowflake_id};

use super::load_student;
use crate::error::ServiceResult;
use crate::fees::summary::{ClassSummary, StudentPosition, SummaryFilter, summarize_class};
use crate::fees::{FeeError, aggregate, ledger, quarter, status, summary};
use crate::state::AppState;

/// Everything the UI needs to show one student's fees
#[derive(Debug, Clone, Serialize)]
pub struct FeeBreakdown {
    pub fee_set: FeeSet,
    pub ledger: Ledger,
    pub summary: LedgerSummary,
    pub quarters: [QuarterEntry; 4],
    pub display: SummaryDisplay,
}

/// Exact-decimal renderings of the summary amounts
#[derive(Debug, Clone, Serialize)]
pub struct SummaryDisplay {
    pub total_amount: String,
    pub paid: String,
    pub pending: String,
    pub overpaid: String,
}

impl From<&LedgerSummary> for SummaryDisplay {
    fn from(s: &LedgerSummary) -> Self {
        Self {
            total_amount: s.total_amount.to_string(),
            paid: s.paid.to_string(),
            pending: s.pending.to_string(),
            overpaid: s.overpaid.to_string(),
        }
    }
}

/// Aggregate, reduce and classify for one student
async fn compute(
    state: &AppState,
    school_id: i64,
    student: &StudentRef,
    today: NaiveDate,
) -> ServiceResult<FeeBreakdown> {
    let fee_set = aggregate::aggregate(state.fees.as_ref(), school_id, student, today).await?;
    let transactions = state
        .ledger
        .transactions_for_student(school_id, student.student_id)
        .await?;
    let ledger = ledger::reduce(&fee_set, &transactions)?;
    let summary = status::summarize(&fee_set, &ledger);
    let quarters = status::quarter_breakdown(&fee_set, &ledger);
    Ok(FeeBreakdown {
        display: SummaryDisplay::from(&summary),
        fee_set,
        ledger,
        summary,
        quarters,
    })
}

pub async fn fee_breakdown(
    state: &AppState,
    school_id: i64,
    student_id: i64,
    today: NaiveDate,
) -> ServiceResult<FeeBreakdown> {
    let student = load_student(state.fees.as_ref(), school_id, student_id).await?;
    compute(state, school_id, &student, today).await
}

/// Per-section and class-total roll-up for one class
pub async fn class_summary(
    state: &AppState,
    school_id: i64,
    class_id: i64,
    filter: &SummaryFilter,
    today: NaiveDate,
) -> ServiceResult<ClassSummary> {
    if let Some(q) = filter.quarter {
        summary::check_quarter(q)?;
    }
    let students = state
        .fees
        .list_students(school_id, class_id, filter.section())
        .await?;

    // One student's broken ledger fails the whole roll-up rather than
    // silently dropping that student from the totals
    let mut positions = Vec::with_capacity(students.len());
    for student in students {
        let breakdown = compute(state, school_id, &student, today)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    school_id,
                    class_id,
                    student_id = student.student_id,
                    error = ?e,
                    "Class summary aborted by student ledger"
                );
            })?;
        positions.push(StudentPosition {
            student,
            summary: breakdown.summary,
            quarters: breakdown.quarters,
        });
    }
    tracing::debug!(school_id, class_id, students = positions.len(), "Class summary computed");
    Ok(summarize_class(class_id, &positions, filter)?)
}

fn scope_for(req: &FeeComponentCreate) -> Result<FeeScope, AppError> {
    let section = req.section.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (req.source, section, req.student_id) {
        (FeeSource::StandardClassFee, None, None) => Ok(FeeScope::class(req.class_id)),
        (FeeSource::StandardClassFee, _, _) => Err(AppError::validation(
            "standard class fee applies to the whole class; section and student_id must be empty",
        )),
        (FeeSource::SectionExtraFee, Some(s), None) => Ok(FeeScope::section(req.class_id, s)),
        (FeeSource::SectionExtraFee, _, _) => Err(AppError::with_message(
            ErrorCode::RequiredField,
            "section extra fee requires a section and no student_id",
        )),
        (FeeSource::StudentService | FeeSource::AdHocFeeRecord, _, Some(student_id)) => {
            Ok(FeeScope::student(req.class_id, student_id))
        }
        (FeeSource::StudentService | FeeSource::AdHocFeeRecord, _, None) => Err(
            AppError::with_message(ErrorCode::RequiredField, "student_id is required"),
        ),
    }
}

async fn ensure_no_active_class_fee(
    state: &AppState,
    school_id: i64,
    class_id: i64,
) -> ServiceResult<()> {
    let existing = state.fees.class_fees(school_id, class_id).await?;
    if existing.iter().any(|c| c.active) {
        return Err(AppError::with_message(
            ErrorCode::DuplicateClassFee,
            format!("Class {class_id} already has an active standard fee"),
        )
        .into());
    }
    Ok(())
}

/// Create a fee component from an administrative request
///
/// Class fees with a quarter policy are split here, once; an explicit
/// `quarters` array without a policy must already sum to `amount`.
pub async fn create_component(
    state: &AppState,
    school_id: i64,
    req: FeeComponentCreate,
) -> ServiceResult<FeeComponent> {
    let label = req.label.trim().to_string();
    if label.is_empty() {
        return Err(AppError::with_message(ErrorCode::RequiredField, "label is required").into());
    }
    let scope = scope_for(&req)?;
    if let (Some(start), Some(end)) = (req.start_date, req.end_date)
        && start > end
    {
        return Err(AppError::validation("start_date must not be after end_date").into());
    }

    let amount = req.amount.into_amount()?;
    if amount.is_negative() {
        return Err(FeeError::NegativeAmount {
            what: "fee component amount",
            amount,
        }
        .into());
    }

    let custom = quarter::parse_inputs(req.quarters)?;
    let quarter_split: Option<QuarterSplit> = match (req.quarter_policy, custom) {
        (Some(policy), custom) => Some(quarter::split(amount, policy, custom)?),
        (None, Some(explicit)) => {
            let split = QuarterSplit::from_array(explicit);
            quarter::validate(amount, &split)?;
            Some(split)
        }
        (None, None) => None,
    };

    if req.source == FeeSource::StandardClassFee {
        ensure_no_active_class_fee(state, school_id, req.class_id).await?;
    }

    let component = FeeComponent {
        id: snowflake_id(),
        source: req.source,
        label,
        amount,
        quarter_split,
        scope,
        active: true,
        due_date: req.due_date,
        start_date: req.start_date,
        end_date: req.end_date,
        created_at: now_millis(),
    };
    state.fees.insert_component(school_id, &component).await?;
    tracing::info!(
        school_id,
        component_id = component.id,
        source = component.source.as_str(),
        amount = %component.amount,
        "Fee component created"
    );
    Ok(component)
}

fn component_not_found(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::FeeComponentNotFound,
        format!("Fee component {id} not found"),
    )
}

/// Soft delete; the component stays visible as history
pub async fn deactivate_component(
    state: &AppState,
    school_id: i64,
    id: i64,
) -> ServiceResult<FeeComponent> {
    if !state.fees.deactivate_component(school_id, id).await? {
        return Err(component_not_found(id).into());
    }
    tracing::info!(school_id, component_id = id, "Fee component deactivated");
    state
        .fees
        .find_component(school_id, id)
        .await?
        .ok_or_else(|| component_not_found(id).into())
}

/// Reactivation creates a new instance; the inactive original keeps its history
pub async fn reactivate_component(
    state: &AppState,
    school_id: i64,
    id: i64,
) -> ServiceResult<FeeComponent> {
    let original = state
        .fees
        .find_component(school_id, id)
        .await?
        .ok_or_else(|| component_not_found(id))?;
    if original.active {
        return Err(AppError::invalid_request(format!("Fee component {id} is already active")).into());
    }
    if original.source == FeeSource::StandardClassFee {
        ensure_no_active_class_fee(state, school_id, original.scope.class_id).await?;
    }

    let component = FeeComponent {
        id: snowflake_id(),
        active: true,
        created_at: now_millis(),
        ..original
    };
    state.fees.insert_component(school_id, &component).await?;
    tracing::info!(
        school_id,
        original_id = id,
        component_id = component.id,
        "Fee component reactivated as new instance"
    );
    Ok(component)
}
