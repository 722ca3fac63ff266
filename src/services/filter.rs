// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Lap-pace validity filter.
//!
//! An activity counts for the challenge only when every lap was run at a
//! believable pace. No lap data at all is treated as unverifiable and
//! therefore invalid.

use crate::time_utils::pace_min_per_km;

/// Outcome of classifying one activity. Both arms carry the computed paces
/// so the invalid report can show them.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Valid { paces: Vec<f64> },
    Invalid { paces: Vec<f64> },
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid { .. })
    }
}

/// Classify an activity from its per-lap average speeds (m/s).
///
/// Invalid when the lap list is empty, or when any lap's pace falls at or
/// outside the `(pace_min, pace_max)` window. Both bounds are exclusive:
/// exactly 4.0 or 15.0 min/km is invalid under the defaults.
pub fn classify(lap_speeds: &[Option<f64>], pace_min: f64, pace_max: f64) -> Verdict {
    if lap_speeds.is_empty() {
        return Verdict::Invalid { paces: Vec::new() };
    }

    let paces: Vec<f64> = lap_speeds.iter().map(|s| pace_min_per_km(*s)).collect();
    if paces.iter().any(|&p| p <= pace_min || p >= pace_max) {
        Verdict::Invalid { paces }
    } else {
        Verdict::Valid { paces }
    }
}

/// Format a pace list for the invalid-activities report.
///
/// `NO_LAPS` marks an activity rejected for having no lap data.
pub fn format_pace_list(paces: &[f64]) -> String {
    if paces.is_empty() {
        return "NO_LAPS".to_string();
    }
    paces
        .iter()
        .map(|p| format!("{:.2}", p))
        .collect::<Vec<_>>()
        .join(", ")
}
