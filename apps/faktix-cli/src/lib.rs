//! # Faktix CLI Library
//!
//! Command-line front end for Faktix: invoice numbering, the profile gate
//! and the formula calculator over a local SQLite database.
//!
//! ## Module Organization
//! ```text
//! faktix_cli/
//! ├── lib.rs          ◄─── You are here (startup & dispatch)
//! ├── config.rs       ◄─── FAKTIX_* environment configuration
//! ├── state.rs        ◄─── AppState (Database, config, clock)
//! ├── error.rs        ◄─── CliError with machine-readable codes
//! └── commands/
//!     ├── mod.rs      ◄─── Cli / Commands (clap) and dispatch
//!     ├── invoice.rs  ◄─── invoice next | new | list | status | delete
//!     ├── profile.rs  ◄─── profile import | check
//!     └── calc.rs     ◄─── calc run | save | list | show | delete
//! ```
//!
//! Every command answers with one JSON document on stdout. Errors go to
//! stderr as `{ "code": ..., "message": ... }`; logs go to stderr as well.

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

use std::fs;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use commands::Cli;
use config::FaktixConfig;
use error::CliResult;
use faktix_db::{Database, DbConfig};
use state::AppState;

/// Runs one command.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Load FaktixConfig from FAKTIX_* variables                           │
/// │  2. Create the data directory if needed                                 │
/// │  3. Connect to SQLite (WAL) and run pending migrations                  │
/// │  4. Dispatch the command with an AppState                               │
/// │  5. Print the JSON result                                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(cli: Cli) -> CliResult<()> {
    let config = FaktixConfig::from_env()?;
    info!(
        db_path = %config.database_path.display(),
        user_id = %config.user_id,
        "Starting Faktix"
    );

    if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let db = Database::new(DbConfig::new(config.database_path.clone())).await?;
    let state = AppState::new(db, config);

    let output = commands::dispatch(cli.command, &state).await;
    state.db.close().await;

    let output = output?;
    debug!("Command finished");
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays valid JSON.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=faktix=trace` - Show trace for faktix crates only
/// - Default: `info,faktix=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,faktix=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
