// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registered athlete credentials and fetch watermark.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// One row of `tokens.csv`: OAuth credentials plus the incremental-fetch
/// watermark for a registered athlete.
///
/// Field order matters; it defines the CSV column order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Strava athlete ID (unique key)
    pub athlete_id: u64,
    pub firstname: String,
    pub lastname: String,
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token expiry as a Unix epoch
    #[serde(deserialize_with = "lenient_epoch")]
    pub expires_at: i64,
    /// Granted OAuth scopes, comma separated
    pub scope: String,
    /// Start epoch of the latest processed activity; 0 = nothing processed yet
    #[serde(default, deserialize_with = "lenient_epoch")]
    pub latest_activity_epoch: i64,
}

impl TokenRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Deserialize an epoch column that may be blank, missing or written as a
/// float by an earlier tool. Anything unparsable becomes 0.
fn lenient_epoch<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    Ok(trimmed.parse::<f64>().map(|v| v as i64).unwrap_or(0))
}
