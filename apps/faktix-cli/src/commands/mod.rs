//! # Commands
//!
//! Command-line surface, one module per subject.
//!
//! ```text
//! faktix
//! ├── invoice  next | new | list | status | delete
//! ├── profile  import | check
//! └── calc     run | save | list | show | delete
//! ```
//!
//! Each module exposes `XArgs` (clap) and `run(args, &AppState)`, returning
//! the JSON document to print.

pub mod calc;
pub mod invoice;
pub mod profile;

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::CliResult;
use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "faktix", version, about = "Fakturace pro živnostníky a malé firmy")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Invoices and invoice numbers
    Invoice(invoice::InvoiceArgs),
    /// The issuer profile and its completeness
    Profile(profile::ProfileArgs),
    /// Material calculators
    Calc(calc::CalcArgs),
}

/// Runs a parsed command.
pub async fn dispatch(command: Commands, state: &AppState) -> CliResult<serde_json::Value> {
    match command {
        Commands::Invoice(args) => invoice::run(args, state).await,
        Commands::Profile(args) => profile::run(args, state).await,
        Commands::Calc(args) => calc::run(args, state).await,
    }
}

/// Serializes a command result.
pub(crate) fn to_output<T: Serialize>(value: &T) -> CliResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}

/// Reads a JSON input file.
pub(crate) fn read_json_file(path: &Path) -> CliResult<String> {
    Ok(fs::read_to_string(path)?)
}
