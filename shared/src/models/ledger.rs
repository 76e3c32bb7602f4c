//! Derived ledger views (never persisted as ground truth)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::amount::Amount;
use super::payment::PaymentTransaction;

/// Human-facing payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeStatus {
    Paid,
    Partial,
    Pending,
    /// No obligation information (e.g. an empty group)
    Unknown,
}

impl FeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Partial => "partial",
            Self::Pending => "pending",
            Self::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for FeeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(Self::Paid),
            "partial" => Ok(Self::Partial),
            "pending" => Ok(Self::Pending),
            "unknown" => Ok(Self::Unknown),
            other => Err(format!("unknown fee status '{other}'")),
        }
    }
}

/// Paid/pending view of one fee component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub component_id: i64,
    pub label: String,
    pub amount: Amount,
    pub due_date: Option<NaiveDate>,
    /// Verified payments targeting this component
    pub paid_direct: Amount,
    /// Share of untargeted payments applied here
    pub paid_allocated: Amount,
    pub paid: Amount,
    pub pending: Amount,
    pub overpaid: Amount,
    pub status: FeeStatus,
}

/// Untargeted ("pay total") payments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnallocatedPool {
    pub received: Amount,
    pub applied: Amount,
    pub remaining: Amount,
}

/// Result of folding transactions over a fee set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub entries: Vec<LedgerEntry>,
    pub unallocated: UnallocatedPool,
    /// Verified payments against components outside the current fee set
    pub detached: Vec<PaymentTransaction>,
    /// Visible for audit, excluded from every total
    pub unverified: Vec<PaymentTransaction>,
}

/// Student-level totals
///
/// `paid + pending - overpaid == total_amount`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub total_amount: Amount,
    pub paid: Amount,
    pub pending: Amount,
    pub overpaid: Amount,
    pub status: FeeStatus,
}

/// One installment's position across components that define a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterEntry {
    pub quarter: u8,
    pub amount: Amount,
    pub paid: Amount,
    pub pending: Amount,
    pub status: FeeStatus,
}
