//! Fee component and fee set models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::amount::{Amount, AmountInput};

/// Where a fee component originated
///
/// Declaration order is the canonical ordering of components inside a fee set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSource {
    /// Standard fee for a whole class
    StandardClassFee,
    /// Extra fee for one section of a class
    SectionExtraFee,
    /// Service assigned to a single student (transport, hostel, ...)
    StudentService,
    /// Fee created directly against a student
    AdHocFeeRecord,
}

impl FeeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StandardClassFee => "standard_class_fee",
            Self::SectionExtraFee => "section_extra_fee",
            Self::StudentService => "student_service",
            Self::AdHocFeeRecord => "ad_hoc_fee_record",
        }
    }
}

impl std::str::FromStr for FeeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard_class_fee" => Ok(Self::StandardClassFee),
            "section_extra_fee" => Ok(Self::SectionExtraFee),
            "student_service" => Ok(Self::StudentService),
            "ad_hoc_fee_record" => Ok(Self::AdHocFeeRecord),
            other => Err(format!("unknown fee source '{other}'")),
        }
    }
}

/// Who a component applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeeScope {
    pub class_id: i64,
    pub section: Option<String>,
    pub student_id: Option<i64>,
}

impl FeeScope {
    pub fn class(class_id: i64) -> Self {
        Self {
            class_id,
            section: None,
            student_id: None,
        }
    }

    pub fn section(class_id: i64, section: impl Into<String>) -> Self {
        Self {
            class_id,
            section: Some(section.into()),
            student_id: None,
        }
    }

    pub fn student(class_id: i64, student_id: i64) -> Self {
        Self {
            class_id,
            section: None,
            student_id: Some(student_id),
        }
    }

    /// Every non-null field must match the student
    pub fn applies_to(&self, student_id: i64, class_id: i64, section: &str) -> bool {
        self.class_id == class_id
            && self.section.as_deref().is_none_or(|s| s == section)
            && self.student_id.is_none_or(|id| id == student_id)
    }
}

/// Four quarterly installments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuarterSplit {
    pub q1: Amount,
    pub q2: Amount,
    pub q3: Amount,
    pub q4: Amount,
}

impl QuarterSplit {
    pub const ZERO: QuarterSplit = QuarterSplit {
        q1: Amount::ZERO,
        q2: Amount::ZERO,
        q3: Amount::ZERO,
        q4: Amount::ZERO,
    };

    pub fn from_array([q1, q2, q3, q4]: [Amount; 4]) -> Self {
        Self { q1, q2, q3, q4 }
    }

    pub fn to_array(self) -> [Amount; 4] {
        [self.q1, self.q2, self.q3, self.q4]
    }

    pub fn total(self) -> Amount {
        self.to_array().iter().sum()
    }

    /// `None` when the four installments overflow an amount
    pub fn checked_total(self) -> Option<Amount> {
        Amount::checked_sum(self.to_array())
    }
}

/// How an annual amount is divided into quarters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    Equal,
    Custom,
}

/// One priced item contributing to a student's obligation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeComponent {
    pub id: i64,
    pub source: FeeSource,
    pub label: String,
    pub amount: Amount,
    pub quarter_split: Option<QuarterSplit>,
    pub scope: FeeScope,
    pub active: bool,
    /// Drives earliest-due-first allocation of untargeted payments
    pub due_date: Option<NaiveDate>,
    /// Service validity window (student services only)
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: i64,
}

impl FeeComponent {
    /// Whether the component's validity window covers `date`
    pub fn in_effect_on(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= date)
            && self.end_date.is_none_or(|end| date <= end)
    }
}

/// Create fee component payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeComponentCreate {
    pub source: FeeSource,
    pub label: String,
    pub amount: AmountInput,
    pub class_id: i64,
    pub section: Option<String>,
    pub student_id: Option<i64>,
    /// Split the amount through the quarter splitter
    pub quarter_policy: Option<SplitPolicy>,
    /// Custom quarters (with `quarter_policy = custom`) or an explicit split
    pub quarters: Option<[AmountInput; 4]>,
    pub due_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Resolved, de-duplicated fee components applicable to one student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSet {
    pub student_id: i64,
    pub class_id: i64,
    pub section: String,
    /// Active components in canonical order
    pub components: Vec<FeeComponent>,
    /// Inactive or out-of-window components, kept for audit display
    pub historical: Vec<FeeComponent>,
    pub total_amount: Amount,
    pub quarter_totals: QuarterSplit,
}

impl FeeSet {
    /// "No fees assigned" is a valid state
    pub fn empty(student_id: i64, class_id: i64, section: impl Into<String>) -> Self {
        Self {
            student_id,
            class_id,
            section: section.into(),
            components: Vec::new(),
            historical: Vec::new(),
            total_amount: Amount::ZERO,
            quarter_totals: QuarterSplit::ZERO,
        }
    }

    pub fn component(&self, id: i64) -> Option<&FeeComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_matching_honors_every_narrowing_field() {
        let class = FeeScope::class(10);
        assert!(class.applies_to(1, 10, "A"));
        assert!(!class.applies_to(1, 11, "A"));

        let section = FeeScope::section(10, "B");
        assert!(section.applies_to(1, 10, "B"));
        assert!(!section.applies_to(1, 10, "A"));

        let student = FeeScope::student(10, 7);
        assert!(student.applies_to(7, 10, "A"));
        assert!(!student.applies_to(8, 10, "A"));
    }

    #[test]
    fn source_serializes_snake_case() {
        let json = serde_json::to_string(&FeeSource::SectionExtraFee).unwrap();
        assert_eq!(json, "\"section_extra_fee\"");
        assert_eq!(FeeSource::AdHocFeeRecord.as_str(), "ad_hoc_fee_record");
        assert_eq!("student_service".parse(), Ok(FeeSource::StudentService));
        assert!("tuition".parse::<FeeSource>().is_err());
    }

    #[test]
    fn quarter_split_total() {
        let split = QuarterSplit::from_array([3001, 3000, 3000, 2999].map(Amount::from_minor));
        assert_eq!(split.total(), Amount::from_minor(12000));
        assert_eq!(split.checked_total(), Some(Amount::from_minor(12000)));

        let huge = QuarterSplit::from_array([i64::MAX, 1, 0, 0].map(Amount::from_minor));
        assert_eq!(huge.checked_total(), None);
    }
}
