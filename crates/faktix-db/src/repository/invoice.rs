//! # Invoice Repository
//!
//! Database operations for invoices and invoice number allocation.
//!
//! ## Invoice Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. ALLOCATE                                                            │
//! │     └── allocate_number() → "2025-0004" (max + 1 over stored numbers)   │
//! │                                                                         │
//! │  2. CREATE DRAFT                                                        │
//! │     └── create_draft() → InvoiceRecord { status: Draft }                │
//! │         (UNIQUE(user_id, invoice_number) conflict → allocate again)     │
//! │                                                                         │
//! │  3. SEND / PAY                                                          │
//! │     └── update_status() → transition checked by faktix-core             │
//! │                                                                         │
//! │  4. (OPTIONAL) DELETE                                                   │
//! │     └── delete() → a deleted top number is handed out again             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{from_json, to_json};
use faktix_core::numbering::{next_invoice_number_from, Clock};
use faktix_core::validation::{validate_customer_name, validate_invoice_number};
use faktix_core::{Customer, InvoiceRecord, InvoiceStatus, LineItem, Money};

/// How many times `create_draft` re-derives a number after losing a race.
const MAX_ALLOCATION_ATTEMPTS: u32 = 3;

const SELECT_INVOICE: &str = r#"
    SELECT
        id,
        invoice_number,
        issue_date,
        due_date,
        customer_json,
        items_json,
        total_haler,
        status
    FROM invoices
"#;

/// One row of `invoices`, before its JSON columns are decoded.
#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    customer_json: String,
    items_json: String,
    total_haler: i64,
    status: InvoiceStatus,
}

impl TryFrom<InvoiceRow> for InvoiceRecord {
    type Error = DbError;

    fn try_from(row: InvoiceRow) -> DbResult<Self> {
        Ok(InvoiceRecord {
            id: row.id,
            invoice_number: row.invoice_number,
            issue_date: row.issue_date,
            due_date: row.due_date,
            customer: from_json::<Customer>(&row.customer_json)?,
            items: from_json::<Vec<LineItem>>(&row.items_json)?,
            total: Money::from_haler(row.total_haler),
            status: row.status,
        })
    }
}

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Inserts an invoice for `user_id`.
    ///
    /// ## Errors
    /// - `Validation` if the number is not `YYYY-N+` or the customer has no name
    /// - `UniqueViolation` if the user already has an invoice with this number
    pub async fn insert(&self, user_id: &str, invoice: &InvoiceRecord) -> DbResult<()> {
        validate_invoice_number(&invoice.invoice_number)?;
        validate_customer_name(&invoice.customer.name)?;

        debug!(
            user_id,
            id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            "Inserting invoice"
        );

        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, user_id, invoice_number,
                issue_date, due_date,
                customer_json, items_json, total_haler, status,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3,
                ?4, ?5,
                ?6, ?7, ?8, ?9,
                ?10, ?10
            )
            "#,
        )
        .bind(&invoice.id)
        .bind(user_id)
        .bind(&invoice.invoice_number)
        .bind(invoice.issue_date)
        .bind(invoice.due_date)
        .bind(to_json(&invoice.customer)?)
        .bind(to_json(&invoice.items)?)
        .bind(invoice.total.haler())
        .bind(invoice.status)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: invoice.invoice_number.clone(),
            },
            other => other,
        })?;

        Ok(())
    }

    /// Allocates the next number and stores a draft invoice under it.
    ///
    /// The issue date is `clock.today()`; the due date is `due_days` later.
    /// If another writer stored the same number first, the number is derived
    /// again from the updated set.
    pub async fn create_draft(
        &self,
        user_id: &str,
        customer: Customer,
        clock: &impl Clock,
        due_days: i64,
    ) -> DbResult<InvoiceRecord> {
        let mut attempt = 1;
        loop {
            let number = self.allocate_number(user_id, clock).await?;
            let invoice = InvoiceRecord::new_draft(number, customer.clone(), clock.today(), due_days)?;

            match self.insert(user_id, &invoice).await {
                Ok(()) => {
                    info!(
                        user_id,
                        invoice_number = %invoice.invoice_number,
                        "Draft invoice created"
                    );
                    return Ok(invoice);
                }
                Err(err) if err.is_unique_violation() && attempt < MAX_ALLOCATION_ATTEMPTS => {
                    warn!(
                        user_id,
                        invoice_number = %invoice.invoice_number,
                        attempt,
                        "Invoice number taken concurrently, allocating again"
                    );
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Gets an invoice by ID.
    pub async fn get_by_id(&self, user_id: &str, id: &str) -> DbResult<Option<InvoiceRecord>> {
        let row = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{SELECT_INVOICE} WHERE user_id = ?1 AND id = ?2"
        ))
        .bind(user_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(InvoiceRecord::try_from).transpose()
    }

    /// All invoices of a user, newest issue date first.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<InvoiceRecord>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(&format!(
            "{SELECT_INVOICE} WHERE user_id = ?1 \
             ORDER BY issue_date DESC, created_at DESC, invoice_number DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(InvoiceRecord::try_from).collect()
    }

    /// Every invoice number the user has, in no particular order.
    pub async fn list_numbers(&self, user_id: &str) -> DbResult<Vec<String>> {
        let numbers = sqlx::query_scalar::<_, String>(
            "SELECT invoice_number FROM invoices WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers)
    }

    /// Next free invoice number for the clock's current year.
    ///
    /// Nothing is reserved: two callers reading the same set get the same
    /// number, and the second `insert` fails with `UniqueViolation`.
    pub async fn allocate_number(&self, user_id: &str, clock: &impl Clock) -> DbResult<String> {
        let year = clock.current_year();

        // narrows the scan; the allocator still rejects malformed suffixes
        let numbers = sqlx::query_scalar::<_, String>(
            "SELECT invoice_number FROM invoices WHERE user_id = ?1 AND invoice_number LIKE ?2",
        )
        .bind(user_id)
        .bind(format!("{year}-%"))
        .fetch_all(&self.pool)
        .await?;

        Ok(next_invoice_number_from(numbers, year))
    }

    /// Changes an invoice's status.
    ///
    /// ## Errors
    /// - `NotFound` if the user has no such invoice
    /// - `Core(InvalidStatusTransition)` if the lifecycle forbids the change
    /// - `ConcurrentModification` if another writer changed the status
    ///   between the read and the write
    pub async fn update_status(
        &self,
        user_id: &str,
        id: &str,
        status: InvoiceStatus,
    ) -> DbResult<InvoiceRecord> {
        let mut invoice = self
            .get_by_id(user_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Invoice", id))?;

        let from = invoice.status;
        invoice.set_status(status)?;
        self.write_status(user_id, id, from, status).await?;

        info!(
            user_id,
            invoice_number = %invoice.invoice_number,
            %from,
            to = %status,
            "Invoice status changed"
        );

        Ok(invoice)
    }

    /// Writes `to` only while the stored status is still `from`, the status
    /// the transition was checked against.
    async fn write_status(
        &self,
        user_id: &str,
        id: &str,
        from: InvoiceStatus,
        to: InvoiceStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                status = ?4,
                updated_at = ?5
            WHERE user_id = ?1 AND id = ?2 AND status = ?3
            "#,
        )
        .bind(user_id)
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.get_by_id(user_id, id).await? {
            None => Err(DbError::not_found("Invoice", id)),
            Some(current) => {
                warn!(
                    user_id,
                    invoice_number = %current.invoice_number,
                    expected = %from,
                    found = %current.status,
                    "Invoice status changed concurrently"
                );
                Err(DbError::ConcurrentModification {
                    entity: "Invoice".to_string(),
                    id: id.to_string(),
                })
            }
        }
    }

    /// Deletes an invoice.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM invoices WHERE user_id = ?1 AND id = ?2")
            .bind(user_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Invoice", id));
        }

        debug!(user_id, id, "Invoice deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
