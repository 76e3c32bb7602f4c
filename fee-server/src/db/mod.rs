//! Store interfaces consumed by the engine
//!
//! The relational store itself is a collaborator; the engine only sees these
//! traits. Every call takes an explicit `school_id`.
//!
//! - [`postgres::PgStore`]: production implementation (sqlx)
//! - [`memory::MemoryStore`]: in-process implementation for development and tests

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use shared::models::{FeeComponent, PaymentOrder, PaymentTransaction, StudentRef};
use thiserror::Error;

use crate::fees::FeeError;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O, connection or query failure: "we could not check"
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness constraint refused the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A stored row cannot be turned into a domain value
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// A stored row breaks a fee invariant
    #[error(transparent)]
    Invariant(#[from] FeeError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::CorruptRecord(err.to_string())
            }
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an append keyed on `(order_id, payment_id)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    Inserted,
    /// The pair was already recorded; carries the existing transaction
    Duplicate(PaymentTransaction),
}

/// Read access to fee sources plus the administrative writes that create them
#[async_trait]
pub trait FeeComponentStore: Send + Sync {
    /// Standard class fee records for a class (active and inactive)
    async fn class_fees(&self, school_id: i64, class_id: i64) -> StoreResult<Vec<FeeComponent>>;

    /// Section extra-fee records for one section of a class
    async fn section_extra_fees(
        &self,
        school_id: i64,
        class_id: i64,
        section: &str,
    ) -> StoreResult<Vec<FeeComponent>>;

    /// Services assigned to a student
    async fn student_services(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<FeeComponent>>;

    /// Fees created directly against a student
    async fn ad_hoc_fees(&self, school_id: i64, student_id: i64) -> StoreResult<Vec<FeeComponent>>;

    async fn find_component(&self, school_id: i64, id: i64) -> StoreResult<Option<FeeComponent>>;

    async fn insert_component(&self, school_id: i64, component: &FeeComponent)
    -> StoreResult<()>;

    /// Soft delete. Returns `false` if no such component exists.
    async fn deactivate_component(&self, school_id: i64, id: i64) -> StoreResult<bool>;

    async fn find_student(&self, school_id: i64, student_id: i64)
    -> StoreResult<Option<StudentRef>>;

    /// Students of a class, optionally narrowed to one section, ordered by id
    async fn list_students(
        &self,
        school_id: i64,
        class_id: i64,
        section: Option<&str>,
    ) -> StoreResult<Vec<StudentRef>>;
}

/// Append-only payment ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn transactions_for_student(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<PaymentTransaction>>;

    async fn transactions_for_component(
        &self,
        school_id: i64,
        component_id: i64,
    ) -> StoreResult<Vec<PaymentTransaction>>;

    /// At-most-once on `(order_id, payment_id)` when both are set
    async fn append_transaction(
        &self,
        school_id: i64,
        tx: &PaymentTransaction,
    ) -> StoreResult<AppendOutcome>;

    async fn insert_order(&self, school_id: i64, order: &PaymentOrder) -> StoreResult<()>;

    async fn find_order(&self, school_id: i64, order_id: &str)
    -> StoreResult<Option<PaymentOrder>>;
}
