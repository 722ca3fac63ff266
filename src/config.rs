// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Everything the pipeline needs is resolved once at startup: Strava OAuth
//! credentials, the challenge analysis window (expressed in the challenge
//! timezone), validity thresholds and rate-limit pacing.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Strava OAuth ---
    /// Strava OAuth client ID (public)
    pub strava_client_id: String,
    /// Strava OAuth client secret
    pub strava_client_secret: String,
    /// Strava REST API base URL
    pub api_base_url: String,
    /// Strava OAuth token endpoint
    pub oauth_token_url: String,
    /// Redirect URI registered with the Strava application
    pub redirect_uri: String,

    // --- Server / storage ---
    /// Server port
    pub port: u16,
    /// Directory holding tokens.csv, valid_runs_log.csv and the reports
    pub data_dir: PathBuf,

    // --- Challenge window ---
    /// Fixed offset of the challenge timezone (UTC+7 by default)
    pub challenge_offset: FixedOffset,
    /// Inclusive start of the analysis window
    pub window_start: DateTime<Utc>,
    /// Inclusive end of the analysis window
    pub window_end: DateTime<Utc>,

    // --- Validity rules ---
    /// Exclusive lower pace bound (min/km); at or below is invalid
    pub pace_min: f64,
    /// Exclusive upper pace bound (min/km); at or above is invalid
    pub pace_max: f64,
    /// Maximum distance counted per athlete per day (km)
    pub daily_cap_km: f64,

    // --- Rate limiting ---
    /// Activities fetched per page
    pub per_page: u32,
    /// Pause between successful API requests
    pub request_delay: Duration,
    /// Pause before retrying after an HTTP 429
    pub rate_limit_backoff: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        let offset = FixedOffset::east_opt(7 * 3600).expect("valid offset");
        Self {
            strava_client_id: "test_client_id".to_string(),
            strava_client_secret: "test_secret".to_string(),
            api_base_url: "https://www.strava.com/api/v3".to_string(),
            oauth_token_url: "https://www.strava.com/oauth/token".to_string(),
            redirect_uri: "http://localhost:8080".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            challenge_offset: offset,
            window_start: parse_local("2025-11-01T00:00:00", offset).expect("valid window start"),
            window_end: parse_local("2025-11-30T23:59:59", offset).expect("valid window end"),
            pace_min: 4.0,
            pace_max: 15.0,
            daily_cap_km: 10.0,
            per_page: 100,
            request_delay: Duration::from_millis(150),
            rate_limit_backoff: Duration::from_secs(15),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Self::default();

        let offset_hours: i32 = opt_parsed("CHALLENGE_UTC_OFFSET_HOURS", 7)?;
        let offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or(ConfigError::Invalid("CHALLENGE_UTC_OFFSET_HOURS"))?;

        let window_start = match env::var("CHALLENGE_START") {
            Ok(s) => parse_local(&s, offset).ok_or(ConfigError::Invalid("CHALLENGE_START"))?,
            Err(_) => defaults.window_start,
        };
        let window_end = match env::var("CHALLENGE_END") {
            Ok(s) => parse_local(&s, offset).ok_or(ConfigError::Invalid("CHALLENGE_END"))?,
            Err(_) => defaults.window_end,
        };

        Ok(Self {
            strava_client_id: env::var("STRAVA_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_ID"))?,
            strava_client_secret: env::var("STRAVA_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("STRAVA_CLIENT_SECRET"))?,
            api_base_url: env::var("STRAVA_API_BASE")
                .unwrap_or_else(|_| defaults.api_base_url.clone()),
            oauth_token_url: env::var("STRAVA_TOKEN_URL")
                .unwrap_or_else(|_| defaults.oauth_token_url.clone()),
            redirect_uri: env::var("REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: opt_parsed("PORT", 8080)?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            challenge_offset: offset,
            window_start,
            window_end,
            pace_min: opt_parsed("PACE_MIN", defaults.pace_min)?,
            pace_max: opt_parsed("PACE_MAX", defaults.pace_max)?,
            daily_cap_km: opt_parsed("DAILY_CAP_KM", defaults.daily_cap_km)?,
            per_page: opt_parsed("FETCH_PER_PAGE", defaults.per_page)?,
            request_delay: Duration::from_millis(opt_parsed("REQUEST_DELAY_MS", 150)?),
            rate_limit_backoff: Duration::from_secs(opt_parsed("RATE_LIMIT_BACKOFF_SECS", 15)?),
        })
    }

    /// Inclusive lower bound of the analysis window as a Unix epoch.
    pub fn window_start_epoch(&self) -> i64 {
        self.window_start.timestamp()
    }

    /// Inclusive upper bound of the analysis window as a Unix epoch.
    pub fn window_end_epoch(&self) -> i64 {
        self.window_end.timestamp()
    }

    pub fn tokens_path(&self) -> PathBuf {
        self.data_dir.join(crate::store::files::TOKENS)
    }

    pub fn run_log_path(&self) -> PathBuf {
        self.data_dir.join(crate::store::files::VALID_RUNS_LOG)
    }

    pub fn leaderboard_path(&self) -> PathBuf {
        self.data_dir.join(crate::store::files::LEADERBOARD)
    }

    pub fn daily_path(&self) -> PathBuf {
        self.data_dir.join(crate::store::files::DAILY_KM)
    }

    pub fn invalid_path(&self) -> PathBuf {
        self.data_dir.join(crate::store::files::INVALID_ACTIVITIES)
    }

    /// Config rooted at a different data directory (used by tests).
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        self.data_dir = dir.to_path_buf();
        self
    }
}

/// Parse a naive local datetime string in the challenge timezone.
fn parse_local(s: &str, offset: FixedOffset) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S").ok()?;
    naive
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Read an optional env var, falling back to a default, erroring on garbage.
fn opt_parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_epochs() {
        let config = Config::default();
        // 2025-11-01 00:00:00 +07:00 and 2025-11-30 23:59:59 +07:00
        assert_eq!(config.window_start_epoch(), 1761930000);
        assert_eq!(config.window_end_epoch(), 1764521999);
    }

    #[test]
    fn test_parse_local_respects_offset() {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        let dt = parse_local("2025-11-01T07:00:00", offset).unwrap();
        assert_eq!(dt.timestamp(), 1761930000 + 7 * 3600);
    }

    #[test]
    fn test_data_paths() {
        let config = Config::default().with_data_dir(Path::new("/tmp/challenge"));
        assert_eq!(config.tokens_path(), Path::new("/tmp/challenge/tokens.csv"));
        assert_eq!(
            config.run_log_path(),
            Path::new("/tmp/challenge/valid_runs_log.csv")
        );
    }
}
