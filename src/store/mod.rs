// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Storage layer (CSV files on local disk).
//!
//! Every file follows the same discipline: load once at run start, mutate in
//! memory, rewrite the whole file at run end. There is no inter-run locking;
//! two concurrent runs race and the later writer wins.

pub mod run_log;
pub mod tokens;

pub use run_log::{RunLog, RunLogStore};
pub use tokens::TokenStore;

/// File names as constants.
pub mod files {
    pub const TOKENS: &str = "tokens.csv";
    pub const VALID_RUNS_LOG: &str = "valid_runs_log.csv";
    pub const LEADERBOARD: &str = "leaderboard.csv";
    pub const DAILY_KM: &str = "daily_km.csv";
    pub const INVALID_ACTIVITIES: &str = "invalid_activities.csv";
}
