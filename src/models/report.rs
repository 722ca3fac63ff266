// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived report rows.
//!
//! Both row types are recomputed from scratch on every ingestion run from the
//! full valid-run log; nothing here is incremental state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of `leaderboard.csv`. Field order defines the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub athlete_id: u64,
    pub firstname: String,
    pub lastname: String,
    /// Sum of in-window distances, no cap applied
    pub total_raw_distance_km: f64,
    /// Sum of per-day capped distances (not a cap on the total)
    pub total_capped_distance_km: f64,
    pub valid_runs_count: u32,
}

/// One row of `daily_km.csv`. Field order defines the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRow {
    pub athlete_id: u64,
    pub firstname: String,
    pub lastname: String,
    pub date_vn: NaiveDate,
    pub raw_distance_km: f64,
    /// `min(raw_distance_km, daily cap)`
    pub capped_distance_km: f64,
    pub valid_activities_count: u32,
}
