// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ingestion orchestrator.
//!
//! One run drives, per athlete: token refresh, watermark-based incremental
//! fetch, lap-pace classification, idempotent merge into the valid-run log,
//! watermark advance, and re-aggregation from the full log. A single
//! athlete's failure never aborts the run; their record is persisted
//! unchanged and the loop moves on.

use chrono::Utc;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{DailyRow, InvalidRun, LeaderboardRow, TokenRecord, ValidRun};
use crate::services::aggregate::{aggregate_athlete, sort_daily, sort_leaderboard};
use crate::services::filter::{classify, format_pace_list, Verdict};
use crate::services::report::ReportWriter;
use crate::services::strava::{ActivitySummary, StravaClient};
use crate::store::{RunLog, RunLogStore, TokenStore};
use crate::time_utils::{local_date, parse_start_date};

/// Activity types that count for the challenge. Anything else is silently
/// ignored: neither merged nor reported as invalid.
fn is_relevant_type(sport_type: &str) -> bool {
    matches!(sport_type, "Run" | "TrailRun")
}

/// Fetch window for one athlete: resume just past the watermark, clamped to
/// the global analysis window.
fn fetch_window(watermark: i64, window_start: i64, window_end: i64) -> (i64, i64) {
    let resume_from = if watermark > 0 { watermark + 1 } else { 0 };
    (window_start.max(resume_from), window_end)
}

/// Everything one ingestion run produces besides the mutated stores.
#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub leaderboard: Vec<LeaderboardRow>,
    pub daily: Vec<DailyRow>,
    pub invalid: Vec<InvalidRun>,
}

/// Drives the full per-athlete ingestion loop.
pub struct IngestService {
    client: StravaClient,
    config: Config,
}

impl IngestService {
    pub fn new(client: StravaClient, config: Config) -> Self {
        Self { client, config }
    }

    /// Load state from disk, ingest, write reports, persist state.
    pub async fn run_to_files(&self) -> Result<IngestOutcome> {
        std::fs::create_dir_all(&self.config.data_dir)?;

        let token_store = TokenStore::new(self.config.tokens_path());
        let log_store = RunLogStore::new(self.config.run_log_path());

        let mut records = token_store.load_all()?;
        let mut log = log_store.load()?;

        let outcome = self.run(&mut records, &mut log).await?;

        token_store.save_all(&records)?;
        log_store.save_all(&log)?;
        ReportWriter::new(&self.config).write_all(
            &outcome.leaderboard,
            &outcome.daily,
            &outcome.invalid,
        )?;

        Ok(outcome)
    }

    /// Run ingestion over in-memory state.
    ///
    /// Token fields and watermarks are updated in place; valid runs merge
    /// into `log`. An empty credential store is the one fatal error.
    pub async fn run(
        &self,
        records: &mut [TokenRecord],
        log: &mut RunLog,
    ) -> Result<IngestOutcome> {
        if records.is_empty() {
            return Err(AppError::Config(
                "no registered athletes in token store".to_string(),
            ));
        }

        tracing::info!(
            athletes = records.len(),
            window_start = %self.config.window_start,
            window_end = %self.config.window_end,
            "Starting ingestion run"
        );

        let mut outcome = IngestOutcome::default();

        for record in records.iter_mut() {
            let aggregated = self.ingest_athlete(record, log, &mut outcome.invalid).await;
            if !aggregated {
                continue;
            }

            let totals = aggregate_athlete(
                record,
                log.runs_for(record.athlete_id),
                self.config.window_start_epoch(),
                self.config.window_end_epoch(),
                self.config.daily_cap_km,
            );
            outcome.daily.extend(totals.daily);
            outcome.leaderboard.push(totals.leaderboard);
        }

        sort_leaderboard(&mut outcome.leaderboard);
        sort_daily(&mut outcome.daily);

        tracing::info!(
            ranked_athletes = outcome.leaderboard.len(),
            invalid_activities = outcome.invalid.len(),
            log_entries = log.len(),
            "Ingestion run finished"
        );
        Ok(outcome)
    }

    /// Steps 1-5 for one athlete. Returns whether the athlete should be
    /// aggregated (skipped athletes keep their record as-is and stay off the
    /// reports for this run).
    async fn ingest_athlete(
        &self,
        record: &mut TokenRecord,
        log: &mut RunLog,
        invalid: &mut Vec<InvalidRun>,
    ) -> bool {
        tracing::info!(
            athlete_id = record.athlete_id,
            name = %record.display_name(),
            watermark = record.latest_activity_epoch,
            "Ingesting athlete"
        );

        // 1. Refresh: keep the best-known credentials either way.
        let refresh = self
            .client
            .refresh_if_stale(record, Utc::now().timestamp())
            .await;
        record.access_token = refresh.access_token;
        record.refresh_token = refresh.refresh_token;
        record.expires_at = refresh.expires_at;

        // 2. Incremental window from the watermark.
        let (fetch_from, fetch_to) = fetch_window(
            record.latest_activity_epoch,
            self.config.window_start_epoch(),
            self.config.window_end_epoch(),
        );

        // 3. Fetch; skipped athletes are still persisted unchanged.
        let activities = if fetch_from >= fetch_to {
            tracing::info!(
                athlete_id = record.athlete_id,
                "Caught up with analysis window, skipping fetch"
            );
            Vec::new()
        } else if record.access_token.is_empty() {
            tracing::warn!(
                athlete_id = record.athlete_id,
                "No access token, skipping athlete"
            );
            return false;
        } else {
            match self
                .client
                .list_activities(&record.access_token, fetch_from, fetch_to)
                .await
            {
                Ok(acts) => {
                    tracing::info!(
                        athlete_id = record.athlete_id,
                        fetched = acts.len(),
                        "Fetched new activities"
                    );
                    acts
                }
                Err(e) => {
                    tracing::warn!(
                        athlete_id = record.athlete_id,
                        error = %e,
                        "Activity fetch failed, skipping athlete"
                    );
                    return false;
                }
            }
        };

        // 4.-5. Classify, merge, advance the watermark.
        let mut new_watermark = record.latest_activity_epoch;
        for activity in activities {
            if !is_relevant_type(&activity.sport_type) {
                continue;
            }
            if let Some(epoch) = self.classify_and_merge(record, &activity, log, invalid).await {
                new_watermark = new_watermark.max(epoch);
            }
        }
        record.latest_activity_epoch = new_watermark;

        true
    }

    /// Classify one activity and merge or reject it. Returns the start epoch
    /// when a valid run was merged.
    async fn classify_and_merge(
        &self,
        record: &TokenRecord,
        activity: &ActivitySummary,
        log: &mut RunLog,
        invalid: &mut Vec<InvalidRun>,
    ) -> Option<i64> {
        // A lap-fetch failure must not abort the run: treat it as no lap
        // data, which classifies as invalid.
        let laps = match self
            .client
            .list_laps(&record.access_token, activity.id)
            .await
        {
            Ok(laps) => laps,
            Err(e) => {
                tracing::warn!(
                    athlete_id = record.athlete_id,
                    activity_id = activity.id,
                    error = %e,
                    "Lap fetch failed, treating as no lap data"
                );
                Vec::new()
            }
        };
        let speeds: Vec<Option<f64>> = laps.iter().map(|l| l.average_speed).collect();

        match classify(&speeds, self.config.pace_min, self.config.pace_max) {
            Verdict::Valid { .. } => {
                let start = match parse_start_date(&activity.start_date) {
                    Ok(dt) => dt,
                    Err(e) => {
                        tracing::warn!(
                            activity_id = activity.id,
                            error = %e,
                            "Unparsable start_date, skipping activity"
                        );
                        return None;
                    }
                };
                log.upsert(build_valid_run(record.athlete_id, activity, &start, &self.config));
                Some(start.timestamp())
            }
            Verdict::Invalid { paces } => {
                tracing::debug!(
                    athlete_id = record.athlete_id,
                    activity_id = activity.id,
                    paces = %format_pace_list(&paces),
                    "Activity rejected"
                );
                invalid.push(build_invalid_run(record, activity, &paces));
                None
            }
        }
    }
}

/// Build a log entry for an accepted activity.
fn build_valid_run(
    athlete_id: u64,
    activity: &ActivitySummary,
    start: &chrono::DateTime<Utc>,
    config: &Config,
) -> ValidRun {
    use crate::models::run::round2;

    ValidRun {
        athlete_id,
        activity_id: activity.id,
        date_vn: local_date(start, config.challenge_offset),
        distance_km: round2(activity.distance / 1000.0),
        start_date: activity.start_date.clone(),
        sport_type: activity.sport_type.clone(),
        name: activity.name.clone(),
        summary_polyline: activity.summary_polyline(),
    }
}

/// Build an invalid-report row for a rejected activity.
fn build_invalid_run(
    record: &TokenRecord,
    activity: &ActivitySummary,
    paces: &[f64],
) -> InvalidRun {
    use crate::models::run::{activity_url, round2};

    InvalidRun {
        athlete_id: record.athlete_id,
        firstname: record.firstname.clone(),
        lastname: record.lastname.clone(),
        activity_id: activity.id,
        name: activity.name.clone(),
        sport_type: activity.sport_type.clone(),
        start_date: activity.start_date.clone(),
        distance_km: round2(activity.distance / 1000.0),
        avg_lap_pace_min_per_km_list: format_pace_list(paces),
        activity_url: activity_url(activity.id),
        map_summary_polyline: activity.summary_polyline(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const WINDOW_START: i64 = 1761930000;
    const WINDOW_END: i64 = 1764521999;

    fn activity(id: u64, sport_type: &str, start_date: &str, meters: f64) -> ActivitySummary {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "Morning Run",
            "type": sport_type,
            "start_date": start_date,
            "distance": meters,
            "map": {"summary_polyline": "abc"}
        }))
        .unwrap()
    }

    #[test]
    fn test_relevant_types() {
        assert!(is_relevant_type("Run"));
        assert!(is_relevant_type("TrailRun"));
        assert!(!is_relevant_type("Ride"));
        assert!(!is_relevant_type("Walk"));
    }

    #[test]
    fn test_fetch_window_without_watermark_starts_at_window() {
        assert_eq!(
            fetch_window(0, WINDOW_START, WINDOW_END),
            (WINDOW_START, WINDOW_END)
        );
    }

    #[test]
    fn test_fetch_window_resumes_past_watermark() {
        let watermark = WINDOW_START + 86400;
        assert_eq!(
            fetch_window(watermark, WINDOW_START, WINDOW_END),
            (watermark + 1, WINDOW_END)
        );
    }

    #[test]
    fn test_fetch_window_watermark_before_window_is_clamped() {
        assert_eq!(
            fetch_window(1000, WINDOW_START, WINDOW_END),
            (WINDOW_START, WINDOW_END)
        );
    }

    #[test]
    fn test_fetch_window_exhausted() {
        let (from, to) = fetch_window(WINDOW_END, WINDOW_START, WINDOW_END);
        assert!(from >= to);
    }

    #[test]
    fn test_build_valid_run_converts_units_and_date() {
        let config = Config::default();
        let act = activity(42, "Run", "2025-11-04T22:15:00Z", 5234.5);
        let start = parse_start_date(&act.start_date).unwrap();
        let run = build_valid_run(7, &act, &start, &config);

        assert_eq!(run.athlete_id, 7);
        assert_eq!(run.activity_id, 42);
        assert_eq!(run.distance_km, 5.23);
        // 22:15 UTC is already Nov 5 in UTC+7
        assert_eq!(run.date_vn, NaiveDate::from_ymd_opt(2025, 11, 5).unwrap());
        assert_eq!(run.summary_polyline.as_deref(), Some("abc"));
    }

    #[test]
    fn test_build_invalid_run_formats_paces_and_url() {
        let record = TokenRecord {
            athlete_id: 7,
            firstname: "An".to_string(),
            lastname: "Nguyen".to_string(),
            access_token: String::new(),
            refresh_token: String::new(),
            expires_at: 0,
            scope: String::new(),
            latest_activity_epoch: 0,
        };
        let act = activity(42, "Run", "2025-11-04T22:15:00Z", 5000.0);

        let row = build_invalid_run(&record, &act, &[3.33, 5.5]);
        assert_eq!(row.avg_lap_pace_min_per_km_list, "3.33, 5.50");
        assert_eq!(row.activity_url, "https://www.strava.com/activities/42");

        let no_laps = build_invalid_run(&record, &act, &[]);
        assert_eq!(no_laps.avg_lap_pace_min_per_km_list, "NO_LAPS");
    }
}
