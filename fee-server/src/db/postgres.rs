//! PostgreSQL store (sqlx)

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{
    Amount, FeeComponent, FeeScope, FeeSource, PaymentOrder, PaymentTransaction, StudentRef,
};
use sqlx::PgPool;

use super::{AppendOutcome, FeeComponentStore, LedgerStore, StoreError, StoreResult};
use crate::fees::quarter;

const COMPONENT_COLUMNS: &str = "id, source, label, amount, q1, q2, q3, q4, class_id, section, \
     student_id, active, due_date, start_date, end_date, created_at";

const TRANSACTION_COLUMNS: &str = "id, student_id, fee_component_ref, amount, method, \
     reference_no, order_id, payment_id, note, verified, timestamp";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_components(
        &self,
        filter: &str,
        school_id: i64,
        key: i64,
    ) -> StoreResult<Vec<FeeComponent>> {
        let sql = format!(
            "SELECT {COMPONENT_COLUMNS} FROM fee_components WHERE school_id = $1 AND {filter} ORDER BY id"
        );
        let rows: Vec<FeeComponentRow> = sqlx::query_as(&sql)
            .bind(school_id)
            .bind(key)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(FeeComponentRow::into_component).collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FeeComponentRow {
    id: i64,
    source: String,
    label: String,
    amount: i64,
    q1: Option<i64>,
    q2: Option<i64>,
    q3: Option<i64>,
    q4: Option<i64>,
    class_id: i64,
    section: Option<String>,
    student_id: Option<i64>,
    active: bool,
    due_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    created_at: i64,
}

impl FeeComponentRow {
    fn into_component(self) -> StoreResult<FeeComponent> {
        let fields = [self.q1, self.q2, self.q3, self.q4].map(|q| q.map(Amount::from_minor));
        let quarter_split = quarter::from_fields(self.id, fields)?;
        let source: FeeSource = self.source.parse().map_err(StoreError::CorruptRecord)?;
        Ok(FeeComponent {
            id: self.id,
            source,
            label: self.label,
            amount: Amount::from_minor(self.amount),
            quarter_split,
            scope: FeeScope {
                class_id: self.class_id,
                section: self.section,
                student_id: self.student_id,
            },
            active: self.active,
            due_date: self.due_date,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    student_id: i64,
    fee_component_ref: Option<i64>,
    amount: i64,
    method: String,
    reference_no: String,
    order_id: Option<String>,
    payment_id: Option<String>,
    note: Option<String>,
    verified: bool,
    timestamp: i64,
}

impl From<TransactionRow> for PaymentTransaction {
    fn from(row: TransactionRow) -> Self {
        PaymentTransaction {
            id: row.id,
            student_id: row.student_id,
            fee_component_ref: row.fee_component_ref,
            amount: Amount::from_minor(row.amount),
            method: row.method,
            reference_no: row.reference_no,
            order_id: row.order_id,
            payment_id: row.payment_id,
            note: row.note,
            verified: row.verified,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    student_id: i64,
    fee_component_ref: Option<i64>,
    amount: i64,
    created_at: i64,
}

impl From<OrderRow> for PaymentOrder {
    fn from(row: OrderRow) -> Self {
        PaymentOrder {
            order_id: row.order_id,
            student_id: row.student_id,
            fee_component_ref: row.fee_component_ref,
            amount: Amount::from_minor(row.amount),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl FeeComponentStore for PgStore {
    async fn class_fees(&self, school_id: i64, class_id: i64) -> StoreResult<Vec<FeeComponent>> {
        self.select_components(
            "source = 'standard_class_fee' AND class_id = $2",
            school_id,
            class_id,
        )
        .await
    }

    async fn section_extra_fees(
        &self,
        school_id: i64,
        class_id: i64,
        section: &str,
    ) -> StoreResult<Vec<FeeComponent>> {
        let sql = format!(
            "SELECT {COMPONENT_COLUMNS} FROM fee_components \
             WHERE school_id = $1 AND source = 'section_extra_fee' AND class_id = $2 AND section = $3 \
             ORDER BY id"
        );
        let rows: Vec<FeeComponentRow> = sqlx::query_as(&sql)
            .bind(school_id)
            .bind(class_id)
            .bind(section)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(FeeComponentRow::into_component).collect()
    }

    async fn student_services(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<FeeComponent>> {
        self.select_components(
            "source = 'student_service' AND student_id = $2",
            school_id,
            student_id,
        )
        .await
    }

    async fn ad_hoc_fees(&self, school_id: i64, student_id: i64) -> StoreResult<Vec<FeeComponent>> {
        self.select_components(
            "source = 'ad_hoc_fee_record' AND student_id = $2",
            school_id,
            student_id,
        )
        .await
    }

    async fn find_component(&self, school_id: i64, id: i64) -> StoreResult<Option<FeeComponent>> {
        let mut rows = self
            .select_components("id = $2", school_id, id)
            .await?;
        Ok(rows.pop())
    }

    async fn insert_component(
        &self,
        school_id: i64,
        component: &FeeComponent,
    ) -> StoreResult<()> {
        let quarters = component.quarter_split.map(|s| s.to_array());
        let q = |i: usize| quarters.map(|qs| qs[i].minor());
        sqlx::query(
            r#"
            INSERT INTO fee_components (school_id, id, source, label, amount, q1, q2, q3, q4,
                                        class_id, section, student_id, active, due_date,
                                        start_date, end_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(school_id)
        .bind(component.id)
        .bind(component.source.as_str())
        .bind(&component.label)
        .bind(component.amount.minor())
        .bind(q(0))
        .bind(q(1))
        .bind(q(2))
        .bind(q(3))
        .bind(component.scope.class_id)
        .bind(&component.scope.section)
        .bind(component.scope.student_id)
        .bind(component.active)
        .bind(component.due_date)
        .bind(component.start_date)
        .bind(component.end_date)
        .bind(component.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn deactivate_component(&self, school_id: i64, id: i64) -> StoreResult<bool> {
        let rows = sqlx::query(
            "UPDATE fee_components SET active = FALSE WHERE school_id = $1 AND id = $2",
        )
        .bind(school_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(rows.rows_affected() > 0)
    }

    async fn find_student(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Option<StudentRef>> {
        let row: Option<StudentRef> = sqlx::query_as(
            "SELECT student_id, class_id, section FROM students WHERE school_id = $1 AND student_id = $2",
        )
        .bind(school_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_students(
        &self,
        school_id: i64,
        class_id: i64,
        section: Option<&str>,
    ) -> StoreResult<Vec<StudentRef>> {
        let rows: Vec<StudentRef> = sqlx::query_as(
            r#"
            SELECT student_id, class_id, section
            FROM students
            WHERE school_id = $1 AND class_id = $2 AND ($3::TEXT IS NULL OR section = $3)
            ORDER BY student_id
            "#,
        )
        .bind(school_id)
        .bind(class_id)
        .bind(section)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn transactions_for_student(
        &self,
        school_id: i64,
        student_id: i64,
    ) -> StoreResult<Vec<PaymentTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions \
             WHERE school_id = $1 AND student_id = $2 ORDER BY timestamp, id"
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(school_id)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn transactions_for_component(
        &self,
        school_id: i64,
        component_id: i64,
    ) -> StoreResult<Vec<PaymentTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions \
             WHERE school_id = $1 AND fee_component_ref = $2 ORDER BY timestamp, id"
        );
        let rows: Vec<TransactionRow> = sqlx::query_as(&sql)
            .bind(school_id)
            .bind(component_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn append_transaction(
        &self,
        school_id: i64,
        tx: &PaymentTransaction,
    ) -> StoreResult<AppendOutcome> {
        // INSERT first and inspect rows_affected: the unique index on
        // (school_id, order_id, payment_id) decides, not a prior SELECT
        let result = sqlx::query(
            r#"
            INSERT INTO payment_transactions (school_id, id, student_id, fee_component_ref, amount,
                                              method, reference_no, order_id, payment_id, note,
                                              verified, timestamp)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(school_id)
        .bind(tx.id)
        .bind(tx.student_id)
        .bind(tx.fee_component_ref)
        .bind(tx.amount.minor())
        .bind(&tx.method)
        .bind(&tx.reference_no)
        .bind(&tx.order_id)
        .bind(&tx.payment_id)
        .bind(&tx.note)
        .bind(tx.verified)
        .bind(tx.timestamp)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(AppendOutcome::Inserted);
        }

        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions \
             WHERE school_id = $1 AND order_id = $2 AND payment_id = $3"
        );
        let existing: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(school_id)
            .bind(&tx.order_id)
            .bind(&tx.payment_id)
            .fetch_optional(&self.pool)
            .await?;
        match existing {
            Some(row) => Ok(AppendOutcome::Duplicate(row.into())),
            None => Err(StoreError::Conflict(format!(
                "payment transaction {} already exists",
                tx.id
            ))),
        }
    }

    async fn insert_order(&self, school_id: i64, order: &PaymentOrder) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_orders (school_id, order_id, student_id, fee_component_ref, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(school_id)
        .bind(&order.order_id)
        .bind(order.student_id)
        .bind(order.fee_component_ref)
        .bind(order.amount.minor())
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_order(
        &self,
        school_id: i64,
        order_id: &str,
    ) -> StoreResult<Option<PaymentOrder>> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT order_id, student_id, fee_component_ref, amount, created_at
            FROM payment_orders
            WHERE school_id = $1 AND order_id = $2
            "#,
        )
        .bind(school_id)
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }
}
