//! # Validation Module
//!
//! Field validators run before anything reaches the database.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: UI / CLI arguments                                           │
//! │  ├── Deserialization into typed records                                │
//! │  └── Lenient parsing of calculator inputs (bad values → 0)             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Invoice number shape, IČO checksum, DIČ shape                     │
//! │  └── Titles and ids                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE(user_id, invoice_number)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use faktix_core::validation::{validate_ico, validate_invoice_number};
//!
//! assert!(validate_invoice_number("2025-0001").is_ok());
//! assert!(validate_ico("27082440").is_ok());
//! ```

use crate::error::ValidationError;
use crate::numbering::parse_invoice_number;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a saved calculation title, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum length of a customer name, in characters.
pub const MAX_CUSTOMER_NAME_LEN: usize = 200;

/// Longest payment term, in days.
pub const MAX_DUE_DAYS: i64 = 365;

fn required(field: &str) -> ValidationError {
    ValidationError::Required {
        field: field.to_string(),
    }
}

// =============================================================================
// Invoice Validators
// =============================================================================

/// Validates an invoice number.
///
/// ## Rules
/// - Must not be empty
/// - Must be `YYYY-N+` (four-digit year, dash, decimal suffix)
///
/// ## Example
/// ```rust
/// use faktix_core::validation::validate_invoice_number;
///
/// assert!(validate_invoice_number("2025-0042").is_ok());
/// assert!(validate_invoice_number("2025-10000").is_ok());
/// assert!(validate_invoice_number("FV-42").is_err());
/// ```
pub fn validate_invoice_number(number: &str) -> ValidationResult<()> {
    if number.trim().is_empty() {
        return Err(required("invoice_number"));
    }

    if parse_invoice_number(number).is_none() {
        return Err(ValidationError::InvalidFormat {
            field: "invoice_number".to_string(),
            reason: "must look like YYYY-NNNN".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(required("customer.name"));
    }

    if name.chars().count() > MAX_CUSTOMER_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "customer.name".to_string(),
            max: MAX_CUSTOMER_NAME_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Czech Identifiers
// =============================================================================

/// Validates an IČO (Czech business registration number).
///
/// ## Rules
/// - Exactly 8 digits (surrounding whitespace ignored)
/// - Weighted checksum: digits 1-7 weighted 8..2, `c = (11 - sum % 11) % 10`,
///   and the eighth digit must equal `c`
///
/// ## Checksum
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  IČO 27082440                                                           │
/// │                                                                         │
/// │  digits   2   7   0   8   2   4   4  │ 0                               │
/// │  weights  8   7   6   5   4   3   2  │                                 │
/// │  sum = 16+49+0+40+8+12+8 = 133                                         │
/// │  133 % 11 = 1  ──►  (11 - 1) % 10 = 0  ══  last digit 0  ✓             │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// ## Example
/// ```rust
/// use faktix_core::validation::validate_ico;
///
/// assert!(validate_ico("27082440").is_ok());
/// assert!(validate_ico("27082441").is_err());
/// assert!(validate_ico("1234").is_err());
/// ```
pub fn validate_ico(ico: &str) -> ValidationResult<()> {
    let ico = ico.trim();

    if ico.is_empty() {
        return Err(required("ico"));
    }

    if ico.len() != 8 || !ico.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "ico".to_string(),
            reason: "must be exactly 8 digits".to_string(),
        });
    }

    let digits: Vec<u32> = ico.bytes().map(|b| u32::from(b - b'0')).collect();
    let sum: u32 = digits[..7]
        .iter()
        .zip((2..=8).rev())
        .map(|(digit, weight)| digit * weight)
        .sum();
    let check = (11 - sum % 11) % 10;

    if digits[7] != check {
        return Err(ValidationError::InvalidChecksum {
            field: "ico".to_string(),
            value: ico.to_string(),
        });
    }

    Ok(())
}

/// Validates a DIČ (Czech VAT identifier).
///
/// ## Rules
/// - `CZ` prefix (case-insensitive)
/// - Followed by 8 to 10 digits
pub fn validate_dic(dic: &str) -> ValidationResult<()> {
    let dic = dic.trim();

    if dic.is_empty() {
        return Err(required("dic"));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "dic".to_string(),
        reason: "must be CZ followed by 8 to 10 digits".to_string(),
    };

    let prefix = dic.get(..2).ok_or_else(invalid)?;
    if !prefix.eq_ignore_ascii_case("CZ") {
        return Err(invalid());
    }

    let digits = &dic[2..];
    if !(8..=10).contains(&digits.len()) || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    Ok(())
}

// =============================================================================
// Calculation Validators
// =============================================================================

/// Validates the title of a saved calculation.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
///
/// ## Returns
/// The trimmed title.
pub fn validate_calculation_title(title: &str) -> ValidationResult<String> {
    let title = title.trim();

    if title.is_empty() {
        return Err(required("title"));
    }

    if title.chars().count() > MAX_TITLE_LEN {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LEN,
        });
    }

    Ok(title.to_string())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ## Example
/// ```rust
/// use faktix_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(required("id"));
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Payment term in days, `0..=MAX_DUE_DAYS`. Zero means due on issue.
pub fn validate_due_days(days: i64) -> ValidationResult<i64> {
    if !(0..=MAX_DUE_DAYS).contains(&days) {
        return Err(ValidationError::OutOfRange {
            field: "due_days".to_string(),
            min: 0,
            max: MAX_DUE_DAYS,
            value: days,
        });
    }
    Ok(days)
}

// =============================================================================
// Unit Tests
// =============================================================================
