//! # faktix-core: Pure Business Logic for Faktix
//!
//! This crate holds the invoicing logic of Faktix that has real invariants:
//! invoice numbering, profile completeness and the formula calculator.
//! Everything here is a pure function over in-memory data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Faktix Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web UI / faktix-cli                             │   │
//! │  │   New invoice ──► Profile gate ──► Calculator ──► Save          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ already-fetched data                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ faktix-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │ numbering │  │  profile  │  │ calculator │  │   money   │  │   │
//! │  │   │ YYYY-NNNN │  │  policy   │  │ expr parser│  │  Kč / DPH │  │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                faktix-db (Persistence Boundary)                 │   │
//! │  │        invoices, profile documents, calculation snapshots       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InvoiceRecord, ProfileRecord, CalculatorSchema, ...)
//! - [`money`] - CZK amounts in haléře and VAT rates in basis points
//! - [`numbering`] - Year-scoped invoice number allocation
//! - [`profile`] - Profile completeness validation
//! - [`calculator`] - Formula calculator with a restricted arithmetic parser
//! - [`validation`] - Field validators used before persistence
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use faktix_core::numbering::next_invoice_number_from;
//!
//! let existing = ["2025-0001", "2025-0003"];
//! assert_eq!(next_invoice_number_from(existing, 2025), "2025-0004");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calculator;
pub mod error;
pub mod money;
pub mod numbering;
pub mod profile;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, FormulaError, ValidationError};
pub use money::{Money, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// User id used by single-user local installations.
///
/// The hosted product scopes every collection by the signed-in user; the
/// local store keeps that shape and falls back to this id.
pub const DEFAULT_USER_ID: &str = "local";

/// Default number of days between issue date and due date.
pub const DEFAULT_DUE_DAYS: i64 = 14;

/// Minimum width of the numeric invoice suffix (`2025-0001`).
pub const INVOICE_SUFFIX_WIDTH: usize = 4;
