//! # Faktix CLI Entry Point
//!
//! ```text
//! $ faktix invoice next
//! { "invoiceNumber": "2025-0004" }
//!
//! $ faktix calc run obklad.json --set m=12.5
//! { "results": [ { "material": "Lepidlo", "quantity": 50.0, "unit": "kg" } ], ... }
//! ```
//!
//! The actual setup is in lib.rs for better testability.

use clap::Parser;
use std::process::ExitCode;

use faktix_cli::commands::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    faktix_cli::init_tracing();

    let cli = Cli::parse();
    match faktix_cli::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match serde_json::to_string_pretty(&err) {
                Ok(json) => eprintln!("{json}"),
                Err(_) => eprintln!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}
