//! # CLI Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Command Function ── Result<serde_json::Value, CliError>                │
//! │         │                                                               │
//! │         ├── DbError::NotFound ───────────┐                              │
//! │         ├── CoreError::InvalidStatus… ───┤                              │
//! │         ├── ConfigError ─────────────────┼──► CliError { code, message }│
//! │         ├── io / JSON file errors ───────┤         │                    │
//! │         └── ProfileCheck (invalid) ──────┘         ▼                    │
//! │                                            stderr (JSON), exit code 1   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failing command prints:
//! ```json
//! { "code": "PROFILE_INCOMPLETE", "message": "Pro vystavení faktury doplňte v profilu: DIČ." }
//! ```

use serde::Serialize;

use crate::config::ConfigError;
use faktix_core::{CoreError, ValidationError};
use faktix_db::DbError;

/// Error returned from commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CliError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// The record already exists (e.g. invoice number taken)
    Conflict,

    /// A lifecycle or business rule refused the change
    BusinessLogic,

    /// The profile is not complete enough to issue invoices
    ProfileIncomplete,

    /// Database operation failed
    DatabaseError,

    /// Environment configuration is invalid
    ConfigError,

    /// Reading an input file failed
    IoError,

    /// Anything else
    Internal,
}

/// Result type for commands.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Creates a new CLI error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        CliError::new(ErrorCode::NotFound, format!("{resource} not found: {id}"))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CliError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to CLI errors.
impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CliError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => CliError::new(
                ErrorCode::Conflict,
                format!("{field} '{value}' already exists"),
            ),
            err @ DbError::ConcurrentModification { .. } => {
                CliError::new(ErrorCode::Conflict, err.to_string())
            }
            DbError::Validation(e) => CliError::validation(e.to_string()),
            DbError::Core(e) => CliError::from(e),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                CliError::validation("Invalid reference")
            }
            DbError::Serialization(e) => {
                tracing::error!("Stored document unreadable: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Stored document is unreadable")
            }
            DbError::PoolExhausted => {
                CliError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                CliError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to CLI errors.
impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnknownInvoiceStatus(status) => CliError::validation(format!(
                "Unknown invoice status '{status}' (expected draft, sent, paid or overdue)"
            )),
            err @ CoreError::InvalidStatusTransition { .. } => {
                CliError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::Validation(e) => CliError::validation(e.to_string()),
        }
    }
}

impl From<ValidationError> for CliError {
    fn from(err: ValidationError) -> Self {
        CliError::validation(err.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::new(ErrorCode::IoError, err.to_string())
    }
}

/// Malformed JSON in an input file.
impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::validation(format!("Invalid JSON: {err}"))
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}
