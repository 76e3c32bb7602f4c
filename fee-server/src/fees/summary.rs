//! Class × section × quarter aggregation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared::models::{Amount, FeeStatus, LedgerSummary, QuarterEntry, StudentRef};

use super::FeeError;
use super::status::roll_up;

/// One student's computed position, input to [`summarize_class`]
#[derive(Debug, Clone)]
pub struct StudentPosition {
    pub student: StudentRef,
    pub summary: LedgerSummary,
    pub quarters: [QuarterEntry; 4],
}

/// Optional filters, combined with AND
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryFilter {
    pub section: Option<String>,
    /// 1..=4; switches figures to that quarter
    pub quarter: Option<u8>,
    pub status: Option<FeeStatus>,
}

impl SummaryFilter {
    /// Section to narrow to; blank means every section
    pub fn section(&self) -> Option<&str> {
        self.section
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    /// `None` on the class total row
    pub section: Option<String>,
    pub student_count: usize,
    pub total_amount: Amount,
    pub paid: Amount,
    pub pending: Amount,
    pub overpaid: Amount,
    pub paid_count: usize,
    pub partial_count: usize,
    pub pending_count: usize,
    pub unknown_count: usize,
    pub status: FeeStatus,
}

impl SummaryRow {
    fn new(section: Option<String>) -> Self {
        Self {
            section,
            student_count: 0,
            total_amount: Amount::ZERO,
            paid: Amount::ZERO,
            pending: Amount::ZERO,
            overpaid: Amount::ZERO,
            paid_count: 0,
            partial_count: 0,
            pending_count: 0,
            unknown_count: 0,
            status: FeeStatus::Unknown,
        }
    }

    fn add(&mut self, figures: &Figures) {
        self.student_count += 1;
        self.total_amount += figures.amount;
        self.paid += figures.paid;
        self.pending += figures.pending;
        self.overpaid += figures.overpaid;
        match figures.status {
            FeeStatus::Paid => self.paid_count += 1,
            FeeStatus::Partial => self.partial_count += 1,
            FeeStatus::Pending => self.pending_count += 1,
            FeeStatus::Unknown => self.unknown_count += 1,
        }
    }

    fn finish(&mut self, statuses: &[FeeStatus]) {
        self.status = roll_up(statuses.iter().copied());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    pub class_id: i64,
    pub quarter: Option<u8>,
    pub sections: Vec<SummaryRow>,
    pub total: SummaryRow,
}

struct Figures {
    amount: Amount,
    paid: Amount,
    pending: Amount,
    overpaid: Amount,
    status: FeeStatus,
}

impl Figures {
    fn select(position: &StudentPosition, quarter: Option<u8>) -> Self {
        match quarter {
            Some(q) => {
                let entry = &position.quarters[usize::from(q - 1)];
                Self {
                    amount: entry.amount,
                    paid: entry.paid,
                    pending: entry.pending,
                    overpaid: Amount::ZERO,
                    status: entry.status,
                }
            }
            None => Self {
                amount: position.summary.total_amount,
                paid: position.summary.paid,
                pending: position.summary.pending,
                overpaid: position.summary.overpaid,
                status: position.summary.status,
            },
        }
    }
}

/// Quarters are numbered 1 to 4
pub fn check_quarter(quarter: u8) -> Result<(), FeeError> {
    if (1..=4).contains(&quarter) {
        Ok(())
    } else {
        Err(FeeError::InvalidQuarter(quarter))
    }
}

/// Roll student positions up into per-section rows and a class total
///
/// Sections are ordered by name. An empty selection yields an `Unknown` total.
pub fn summarize_class(
    class_id: i64,
    positions: &[StudentPosition],
    filter: &SummaryFilter,
) -> Result<ClassSummary, FeeError> {
    if let Some(q) = filter.quarter {
        check_quarter(q)?;
    }

    let mut sections: BTreeMap<&str, (SummaryRow, Vec<FeeStatus>)> = BTreeMap::new();
    let mut total = SummaryRow::new(None);
    let mut total_statuses = Vec::new();

    for position in positions {
        let section = position.student.section.as_str();
        if filter.section().is_some_and(|s| s != section) {
            continue;
        }
        let figures = Figures::select(position, filter.quarter);
        if filter.status.is_some_and(|s| s != figures.status) {
            continue;
        }

        let (row, statuses) = sections
            .entry(section)
            .or_insert_with(|| (SummaryRow::new(Some(section.to_string())), Vec::new()));
        row.add(&figures);
        statuses.push(figures.status);
        total.add(&figures);
        total_statuses.push(figures.status);
    }

    total.finish(&total_statuses);
    let sections = sections
        .into_values()
        .map(|(mut row, statuses)| {
            row.finish(&statuses);
            row
        })
        .collect();

    Ok(ClassSummary {
        class_id,
        quarter: filter.quarter,
        sections,
        total,
    })
}
