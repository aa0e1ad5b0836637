//! # Database Errors
//!
//! ```text
//! sqlx::Error ─┐
//! MigrateError ├──► DbError ──► CliError { code, message }
//! serde_json  ─┤
//! CoreError   ─┘
//! ```
//!
//! Constraint failures are classified by SQLite's error kind, not by message
//! text. The message is only read to name the offending columns.

use faktix_core::{CoreError, ValidationError};
use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id for this user. Rows of other users are reported
    /// the same way.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE constraint refused the write, e.g. an invoice number that
    /// another writer stored first.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// The row changed between read and conditional write.
    #[error("{entity} {id} was changed by another writer")]
    ConcurrentModification { entity: String, id: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The file could not be opened or created, or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A JSON column could not be written or read back.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A faktix-core rule refused the change (e.g. a status transition).
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Columns named by a SQLite constraint message, e.g.
/// `"UNIQUE constraint failed: invoices.user_id, invoices.invoice_number"`
/// gives `"invoices.user_id, invoices.invoice_number"`.
fn constraint_columns(message: &str) -> &str {
    message
        .split_once("constraint failed: ")
        .map(|(_, columns)| columns)
        .unwrap_or(message)
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation => {
                    DbError::duplicate(constraint_columns(db_err.message()), "unknown")
                }
                ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                },
                _ => DbError::QueryFailed(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
