//! In-process store
//!
//! Backs development runs without Postgres and every HTTP-level test. Honors
//! the same contracts as [`super::PgStore`]: school scoping, append-only ledger,
//! one active class fee per class, unique `(order_id, payment_id)`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{FeeComponent, FeeSource, PaymentOrder, PaymentTransaction, StudentRef};

use super::{AppendOutcome, FeeComponentStore, LedgerStore, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    students: BTreeMap<(i64, i64), StudentRef>,
    components: BTreeMap<(i64, i64), FeeComponent>,
    orders: BTreeMap<(i64, String), PaymentOrder>,
    /// Append order is preserved
    transactions: Vec<(i64, PaymentTransaction)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster is maintained outside the engine; this seeds it.
    pub fn add_student(&self, school_id: i64, student: StudentRef) {
        self.inner
            .write()
            .students
            .insert((school_id, student.student_id), student);
    }

    /// Make every subsequent call fail as if the backing store were down
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }

    fn components_where(
        &self,
        school_id: i64,
        pred: impl Fn(&FeeComponent) -> bool,
    ) -> StoreResult<Vec<FeeComponent>> {
        self.check_available()?;
        let inner = self.inner.read();
        Ok(inner
            .components
            .iter()
            .filter(|((school, _), c)| *school == school_id && pred(c))
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn transactions_where(
        &self,
        school_id: i64,
        pred: impl Fn(&PaymentTransaction) -> bool,
    ) -> StoreResult<Vec<PaymentTransaction>> {
        self.check_available()?;
        let inner = self.inner.read();
        Ok(inner
            .transactions
            .iter()
            .filter(|(school, tx)| *school == school_id && pred(tx))
            .map(|(_, tx)| tx.clone())
            .collect())
    }
}

#[async_trait]
impl FeeComponentStore for MemoryStore {
    async fn class_fees(&self, school_id: i64, class_id: i64) -> StoreResult<Vec<FeeComponent>> {
        self.components_where(school_id, |c| {
            c.source == FeeSource::StandardClassFee && c.scope.class_id == class_id
        })
    }

    async fn section_extra_fees(
        &self,
        school_id: i64,
        class_id: i64,
        section: &str,
    ) -> StoreResult<Vec<FeeComponent>> {
        self.components_where(school_id, |c| {
            c.source == FeeSource::SectionExtraFee
                && c.scope.class_id == class_id
                && c.scope.section.as_deref() == Some(section)
        })
    }

    async fn student_services(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<FeeComponent>> {
        self.components_where(school_id, |c| {
            c.source == FeeSource::StudentService && c.scope.student_id == Some(student_id)
        })
    }

    async fn ad_hoc_fees(&self, school_id: i64, student_id: i64) -> StoreResult<Vec<FeeComponent>> {
        self.components_where(school_id, |c| {
            c.source == FeeSource::AdHocFeeRecord && c.scope.student_id == Some(student_id)
        })
    }

    async fn find_component(&self, school_id: i64, id: i64) -> StoreResult<Option<FeeComponent>> {
        self.check_available()?;
        Ok(self.inner.read().components.get(&(school_id, id)).cloned())
    }

    async fn insert_component(
        &self,
        school_id: i64,
        component: &FeeComponent,
    ) -> StoreResult<()> {
        self.check_available()?;
        let mut inner = self.inner.write();
        if inner.components.contains_key(&(school_id, component.id)) {
            return Err(StoreError::Conflict(format!(
                "fee component {} already exists",
                component.id
            )));
        }
        if component.source == FeeSource::StandardClassFee && component.active {
            let clash = inner.components.iter().any(|((school, _), c)| {
                *school == school_id
                    && c.source == FeeSource::StandardClassFee
                    && c.active
                    && c.scope.class_id == component.scope.class_id
            });
            if clash {
                return Err(StoreError::Conflict(format!(
                    "class {} already has an active standard fee",
                    component.scope.class_id
                )));
            }
        }
        inner
            .components
            .insert((school_id, component.id), component.clone());
        Ok(())
    }

    async fn deactivate_component(&self, school_id: i64, id: i64) -> StoreResult<bool> {
        self.check_available()?;
        let mut inner = self.inner.write();
        match inner.components.get_mut(&(school_id, id)) {
            Some(component) => {
                component.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_student(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Option<StudentRef>> {
        self.check_available()?;
        Ok(self.inner.read().students.get(&(school_id, student_id)).cloned())
    }

    async fn list_students(
        &self,
        school_id: i64,
        class_id: i64,
        section: Option<&str>,
    ) -> StoreResult<Vec<StudentRef>> {
        self.check_available()?;
        let inner = self.inner.read();
        Ok(inner
            .students
            .iter()
            .filter(|((school, _), s)| {
                *school == school_id
                    && s.class_id == class_id
                    && section.is_none_or(|sec| s.section == sec)
            })
            .map(|(_, s)| s.clone())
            .collect())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn transactions_for_student(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<PaymentTransaction>> {
        self.transactions_where(school_id, |tx| tx.student_id == student_id)
    }

    async fn transactions_for_component(
        &self,
        school_id: i64,
        component_id: i64,
    ) -> StoreResult<Vec<PaymentTransaction>> {
        self.transactions_where(school_id, |tx| tx.fee_component_ref == Some(component_id))
    }

    async fn append_transaction(
        &self,
        school_id: i64,
        tx: &PaymentTransaction,
    ) -> StoreResult<AppendOutcome> {
        self.check_available()?;
        // Single write lock: check and insert cannot interleave
        let mut inner = self.inner.write();
        if let (Some(order_id), Some(payment_id)) = (&tx.order_id, &tx.payment_id) {
            let existing = inner.transactions.iter().find(|(school, t)| {
                *school == school_id
                    && t.order_id.as_ref() == Some(order_id)
                    && t.payment_id.as_ref() == Some(payment_id)
            });
            if let Some((_, existing)) = existing {
                return Ok(AppendOutcome::Duplicate(existing.clone()));
            }
        }
        inner.transactions.push((school_id, tx.clone()));
        Ok(AppendOutcome::Inserted)
    }

    async fn insert_order(&self, school_id: i64, order: &PaymentOrder) -> StoreResult<()> {
        self.check_available()?;
        let mut inner = self.inner.write();
        let key = (school_id, order.order_id.clone());
        if inner.orders.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "payment order {} already exists",
                order.order_id
            )));
        }
        inner.orders.insert(key, order.clone());
        Ok(())
    }

    async fn find_order(
        &self,
        school_id: i64,
        order_id: &str,
    ) -> StoreResult<Option<PaymentOrder>> {
        self.check_available()?;
        Ok(self
            .inner
            .read()
            .orders
            .get(&(school_id, order_id.to_string()))
            .cloned())
    }
}
