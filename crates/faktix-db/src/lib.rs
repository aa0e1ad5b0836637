//! # faktix-db: Database Layer for Faktix
//!
//! This crate provides database access for Faktix.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Faktix Data Flow                                 │
//! │                                                                         │
//! │  faktix-cli command (invoice new, calc save, ...)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     faktix-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ InvoiceRepo     │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProfileRepo     │   │ 001_init.sql │  │   │
//! │  │   │ Connection    │    │ CalculationRepo │   │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/faktix/faktix.db                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every table carries a `user_id` column and every repository method takes
//! the user id, so one database can hold several users' data without any
//! query reaching across them.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (invoice, profile, calculation)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use faktix_core::numbering::SystemClock;
//! use faktix_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("faktix.db")).await?;
//!
//! let number = db.invoices().allocate_number("local", &SystemClock).await?;
//! let check = db.profiles().check("local", &Default::default()).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

// Repository re-exports for convenience
pub use repository::calculation::CalculationRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::profile::ProfileRepository;
