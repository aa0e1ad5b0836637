//! # Repository Module
//!
//! Database repository implementations for Faktix.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                            │
//! │       │                                                                 │
//! │       │  db.invoices().allocate_number("local", &SystemClock)           │
//! │       ▼                                                                 │
//! │  InvoiceRepository                                                      │
//! │  ├── list_numbers(user_id)          ── SQL ──► invoices                 │
//! │  └── faktix_core::numbering         ── pure ──► "2025-0004"             │
//! │                                                                         │
//! │  SQL lives here; rules live in faktix-core.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`invoice::InvoiceRepository`] - Invoices and number allocation
//! - [`profile::ProfileRepository`] - Profile documents and completeness checks
//! - [`calculation::CalculationRepository`] - Saved calculator snapshots

pub mod calculation;
pub mod invoice;
pub mod profile;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DbResult;

/// Encodes a value for a JSON text column.
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> DbResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decodes a JSON text column.
pub(crate) fn from_json<T: DeserializeOwned>(text: &str) -> DbResult<T> {
    Ok(serde_json::from_str(text)?)
}
