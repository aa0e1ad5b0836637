//! # Application State
//!
//! Everything a command needs, built once in [`crate::run`].
//!
//! ```text
//! ┌──────────────────┐ ┌──────────────────────┐ ┌──────────────────────┐
//! │    Database      │ │    FaktixConfig      │ │    Clock             │
//! │  • SQLite pool   │ │  • user id           │ │  • today / year for  │
//! │  • repositories  │ │  • due days          │ │    numbering         │
//! │                  │ │  • VAT markers       │ │                      │
//! └──────────────────┘ └──────────────────────┘ └──────────────────────┘
//! ```

use faktix_core::numbering::{Clock, SystemClock};
use faktix_core::profile::ProfilePolicy;
use faktix_db::Database;

use crate::config::FaktixConfig;

/// Shared state handed to every command.
pub struct AppState {
    pub db: Database,
    pub config: FaktixConfig,
    pub clock: Box<dyn Clock + Send + Sync>,
    policy: ProfilePolicy,
}

impl AppState {
    /// State on the wall clock.
    pub fn new(db: Database, config: FaktixConfig) -> Self {
        AppState::with_clock(db, config, SystemClock)
    }

    /// State on a chosen clock.
    pub fn with_clock(db: Database, config: FaktixConfig, clock: impl Clock + Send + Sync + 'static) -> Self {
        let policy = config.profile_policy();
        AppState {
            db,
            config,
            clock: Box::new(clock),
            policy,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    /// Profile policy including configured VAT-exempt markers.
    pub fn policy(&self) -> &ProfilePolicy {
        &self.policy
    }
}
