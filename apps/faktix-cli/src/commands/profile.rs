//! # Profile Commands
//!
//! `import` stores a profile document; `check` reports whether invoices may
//! be issued. A file that cannot be read as a JSON object checks as
//! "no profile", the same as a missing row.

use clap::{Args, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::commands::{read_json_file, to_output};
use crate::error::CliResult;
use crate::state::AppState;
use faktix_core::profile::check_profile_json;

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// Store a profile document (JSON) and check it
    Import { file: PathBuf },
    /// Check the stored profile, or a profile file without storing it
    Check {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

pub async fn run(args: ProfileArgs, state: &AppState) -> CliResult<serde_json::Value> {
    match args.command {
        ProfileCommands::Import { file } => {
            let document: serde_json::Value = serde_json::from_str(&read_json_file(&file)?)?;
            let profiles = state.db.profiles();
            profiles.upsert(state.user_id(), &document).await?;
            info!(file = %file.display(), "Profile imported");

            let check = profiles.check(state.user_id(), state.policy()).await?;
            to_output(&check)
        }
        ProfileCommands::Check { file: Some(file) } => {
            let check = check_profile_json(&read_json_file(&file)?, state.policy());
            to_output(&check)
        }
        ProfileCommands::Check { file: None } => {
            let check = state.db.profiles().check(state.user_id(), state.policy()).await?;
            to_output(&check)
        }
    }
}
