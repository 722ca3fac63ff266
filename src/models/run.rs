// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Valid and invalid activity records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One entry of the durable valid-run log (`valid_runs_log.csv`).
///
/// Keyed by `(athlete_id, activity_id)`; merging the same key twice
/// overwrites. Field order defines the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidRun {
    pub athlete_id: u64,
    pub activity_id: u64,
    /// Calendar date in the challenge timezone
    pub date_vn: NaiveDate,
    /// Distance in km, rounded to 2 decimals
    pub distance_km: f64,
    /// Source-reported start timestamp (UTC, RFC 3339)
    pub start_date: String,
    #[serde(rename = "type")]
    pub sport_type: String,
    pub name: String,
    pub summary_polyline: Option<String>,
}

/// A rejected activity from the current ingestion run.
///
/// These are not durable: every run reports only its own rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvalidRun {
    pub athlete_id: u64,
    pub firstname: String,
    pub lastname: String,
    pub activity_id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub sport_type: String,
    pub start_date: String,
    pub distance_km: f64,
    /// Per-lap paces formatted "{:.2}" and joined with ", ", or `NO_LAPS`
    pub avg_lap_pace_min_per_km_list: String,
    pub activity_url: String,
    pub map_summary_polyline: Option<String>,
}

/// Round a distance to 2 decimal places for storage and reporting.
pub fn round2(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Public link to an activity on Strava, used in the invalid report.
pub fn activity_url(activity_id: u64) -> String {
    format!("https://www.strava.com/activities/{}", activity_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(13.199999), 13.2);
        assert_eq!(round2(3.456), 3.46);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_activity_url() {
        assert_eq!(
            activity_url(123456),
            "https://www.strava.com/activities/123456"
        );
    }
}
