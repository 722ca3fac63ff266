// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-athlete aggregation of the valid-run log.
//!
//! Runs over the FULL log (history plus this run's merges) restricted to the
//! analysis window, so totals are deterministic no matter how the activities
//! arrived. The daily cap is applied per local date before summing into the
//! capped total.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::run::round2;
use crate::models::{DailyRow, LeaderboardRow, TokenRecord, ValidRun};
use crate::time_utils::parse_start_date;

/// Aggregation output for one athlete.
#[derive(Debug, Clone)]
pub struct AthleteTotals {
    pub daily: Vec<DailyRow>,
    pub leaderboard: LeaderboardRow,
}

/// Recompute daily rows and the leaderboard row for one athlete.
///
/// Only runs whose start epoch lies in `[window_start, window_end]`
/// (inclusive) count; everything else stays in the log but contributes
/// nothing. Days with no valid run produce no row.
pub fn aggregate_athlete<'a>(
    record: &TokenRecord,
    runs: impl IntoIterator<Item = &'a ValidRun>,
    window_start: i64,
    window_end: i64,
    daily_cap_km: f64,
) -> AthleteTotals {
    // date -> (raw km, valid activity count)
    let mut by_date: BTreeMap<chrono::NaiveDate, (f64, u32)> = BTreeMap::new();
    let mut total_raw = 0.0;
    let mut run_count: u32 = 0;

    for run in runs {
        let epoch = match parse_start_date(&run.start_date) {
            Ok(dt) => dt.timestamp(),
            Err(e) => {
                tracing::warn!(
                    athlete_id = run.athlete_id,
                    activity_id = run.activity_id,
                    error = %e,
                    "Unparsable start_date in run log, skipping"
                );
                continue;
            }
        };
        if epoch < window_start || epoch > window_end {
            continue;
        }

        run_count += 1;
        total_raw += run.distance_km;
        let entry = by_date.entry(run.date_vn).or_insert((0.0, 0));
        entry.0 += run.distance_km;
        entry.1 += 1;
    }

    let mut total_capped = 0.0;
    let daily = by_date
        .into_iter()
        .map(|(date, (raw, count))| {
            let capped = raw.min(daily_cap_km);
            total_capped += capped;
            DailyRow {
                athlete_id: record.athlete_id,
                firstname: record.firstname.clone(),
                lastname: record.lastname.clone(),
                date_vn: date,
                raw_distance_km: round2(raw),
                capped_distance_km: round2(capped),
                valid_activities_count: count,
            }
        })
        .collect();

    AthleteTotals {
        daily,
        leaderboard: LeaderboardRow {
            athlete_id: record.athlete_id,
            firstname: record.firstname.clone(),
            lastname: record.lastname.clone(),
            total_raw_distance_km: round2(total_raw),
            total_capped_distance_km: round2(total_capped),
            valid_runs_count: run_count,
        },
    }
}

/// Sort leaderboard rows: descending capped total, ties broken by descending
/// valid-run count.
pub fn sort_leaderboard(rows: &mut [LeaderboardRow]) {
    rows.sort_by(|a, b| {
        b.total_capped_distance_km
            .partial_cmp(&a.total_capped_distance_km)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.valid_runs_count.cmp(&a.valid_runs_count))
    });
}

/// Sort daily rows by (date, athlete).
pub fn sort_daily(rows: &mut [DailyRow]) {
    rows.sort_by(|a, b| {
        a.date_vn
            .cmp(&b.date_vn)
            .then_with(|| a.athlete_id.cmp(&b.athlete_id))
    });
}
