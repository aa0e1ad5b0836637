//! # Error Types
//!
//! Domain-specific error types for faktix-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  faktix-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                        │
//! │  ├── ValidationError  - Input validation failures                       │
//! │  └── FormulaError     - One calculator formula failed (never escapes    │
//! │                         the calculator; reported per formula)           │
//! │                                                                         │
//! │  faktix-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  faktix-cli errors (app)                                               │
//! │  └── CliError         - What the operator sees (code + message)         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → CliError → stdout/stderr │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An incomplete profile is NOT an error: it is a normal
//! [`ProfileCheck`](crate::profile::ProfileCheck) outcome.

use thiserror::Error;

use crate::types::InvoiceStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Status string does not name an invoice status.
    #[error("Unknown invoice status: {0}")]
    UnknownInvoiceStatus(String),

    /// The requested status change is not allowed.
    ///
    /// ## When This Occurs
    /// - Marking a paid invoice as sent again
    /// - Marking a draft as overdue (it was never sent)
    #[error("Invoice {invoice_number} cannot change from {from} to {to}")]
    InvalidStatusTransition {
        invoice_number: String,
        from: InvoiceStatus,
        to: InvoiceStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID, invalid invoice number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange { field: String, min: i64, max: i64, value: i64 },

    /// Checksum digit does not match (IČO).
    #[error("{field} '{value}' has an invalid checksum")]
    InvalidChecksum { field: String, value: String },
}

// =============================================================================
// Formula Error
// =============================================================================

/// Why a single calculator formula could not be evaluated.
///
/// The calculator catches these per formula, logs them and skips the
/// formula; they never abort the remaining formulas of a schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,

    #[error("formula is {len} characters long, limit is {max}")]
    TooLong { len: usize, max: usize },

    /// Anything outside digits, `.`, whitespace, `+ - * / ( )` and field names.
    #[error("character '{ch}' at position {position} is not allowed")]
    DisallowedCharacter { ch: char, position: usize },

    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    /// A word that is not a field of the schema (e.g. a function name).
    #[error("'{0}' is not an input field of this calculator")]
    UnknownIdentifier(String),

    #[error("unexpected '{found}' at position {position}")]
    UnexpectedToken { found: String, position: usize },

    #[error("formula ends unexpectedly")]
    UnexpectedEnd,

    #[error("formula nests deeper than {max} levels")]
    TooDeep { max: usize },

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
