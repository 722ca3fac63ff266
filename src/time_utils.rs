// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for timestamps, local challenge dates and pace conversion.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Convert an average speed in m/s to a pace in minutes per kilometer.
///
/// Zero, negative or absent speeds map to infinity so they always fall
/// outside any finite pace window.
pub fn pace_min_per_km(mps: Option<f64>) -> f64 {
    match mps {
        Some(v) if v > 0.0 => (1000.0 / v) / 60.0,
        _ => f64::INFINITY,
    }
}

/// Parse a Strava `start_date` (RFC 3339 with `Z` suffix) into a UTC timestamp.
pub fn parse_start_date(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Calendar date of a UTC instant after shifting into the challenge timezone.
pub fn local_date(dt: &DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    dt.with_timezone(&offset).date_naive()
}
