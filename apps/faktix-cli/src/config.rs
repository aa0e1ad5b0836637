//! # Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`FAKTIX_*`)
//! 2. Defaults (this file)
//!
//! | Variable                    | Default                               |
//! |-----------------------------|---------------------------------------|
//! | `FAKTIX_DB_PATH`            | platform data dir + `faktix.db`       |
//! | `FAKTIX_USER_ID`            | `local`                               |
//! | `FAKTIX_DUE_DAYS`           | `14`                                  |
//! | `FAKTIX_VAT_EXEMPT_MARKERS` | none (comma-separated, added to the   |
//! |                             | built-in sole-trader markers)         |

use directories::ProjectDirs;
use serde::Serialize;
use std::env;
use std::path::PathBuf;

use faktix_core::profile::ProfilePolicy;
use faktix_core::validation::validate_due_days;
use faktix_core::{DEFAULT_DUE_DAYS, DEFAULT_USER_ID};

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaktixConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Whose rows every command reads and writes.
    pub user_id: String,

    /// Days between issue and due date for new invoices.
    pub due_days: i64,

    /// Extra business-type markers that waive the DIČ requirement.
    pub vat_exempt_markers: Vec<String>,
}

impl FaktixConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through `lookup` instead of the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = match lookup("FAKTIX_DB_PATH").filter(|p| !p.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };

        let user_id = lookup("FAKTIX_USER_ID")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

        let due_days = match lookup("FAKTIX_DUE_DAYS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|days| validate_due_days(days).ok())
                .ok_or_else(|| ConfigError::InvalidValue("FAKTIX_DUE_DAYS".to_string()))?,
            None => DEFAULT_DUE_DAYS,
        };

        let vat_exempt_markers = lookup("FAKTIX_VAT_EXEMPT_MARKERS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(FaktixConfig {
            database_path,
            user_id,
            due_days,
            vat_exempt_markers,
        })
    }

    /// Default profile policy extended with the configured markers.
    pub fn profile_policy(&self) -> ProfilePolicy {
        self.vat_exempt_markers
            .iter()
            .fold(ProfilePolicy::default(), |policy, marker| {
                policy.with_vat_exempt_marker(marker)
            })
    }
}

/// Platform data directory for the database file.
///
/// - **Linux**: `~/.local/share/faktix/faktix.db`
/// - **macOS**: `~/Library/Application Support/cz.faktix.faktix/faktix.db`
/// - **Windows**: `%APPDATA%\faktix\faktix\data\faktix.db`
fn default_database_path() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from("cz", "faktix", "faktix")
        .ok_or_else(|| ConfigError::MissingRequired("FAKTIX_DB_PATH".to_string()))?;
    Ok(dirs.data_dir().join("faktix.db"))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
