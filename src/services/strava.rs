// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Strava API client for the ingestion pipeline.
//!
//! Handles:
//! - Token refresh (non-fatal on failure) and authorization-code exchange
//! - Paginated activity listing within a time window
//! - Per-activity lap fetches
//! - Rate limit (429) backoff with bounded pacing between requests

use serde::Deserialize;
use std::time::Duration;

use crate::config::Config;
use crate::error::AppError;
use crate::models::TokenRecord;

/// Refresh the access token this many seconds before it actually expires.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 300;

/// Strava API client.
#[derive(Clone)]
pub struct StravaClient {
    http: reqwest::Client,
    base_url: String,
    token_url: String,
    client_id: String,
    client_secret: String,
    per_page: u32,
    request_delay: Duration,
    rate_limit_backoff: Duration,
}

impl StravaClient {
    /// Create a new Strava client from the application config.
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            token_url: config.oauth_token_url.clone(),
            client_id: config.strava_client_id.clone(),
            client_secret: config.strava_client_secret.clone(),
            per_page: config.per_page,
            request_delay: config.request_delay,
            rate_limit_backoff: config.rate_limit_backoff,
        }
    }

    /// Refresh an athlete's access token if it expires within the safety
    /// margin (or already has).
    ///
    /// Refresh failure is non-fatal: the original credentials come back with
    /// `refreshed = false` and the subsequent fetch surfaces any real token
    /// problem. No refresh token means nothing to do.
    pub async fn refresh_if_stale(&self, record: &TokenRecord, now_epoch: i64) -> TokenRefresh {
        let unchanged = TokenRefresh {
            access_token: record.access_token.clone(),
            refresh_token: record.refresh_token.clone(),
            expires_at: record.expires_at,
            refreshed: false,
        };

        if record.refresh_token.is_empty()
            || now_epoch <= record.expires_at - TOKEN_REFRESH_MARGIN_SECS
        {
            return unchanged;
        }

        tracing::info!(athlete_id = record.athlete_id, "Refreshing access token");

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "refresh_token"),
                ("refresh_token", record.refresh_token.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    athlete_id = record.athlete_id,
                    error = %e,
                    "Token refresh request failed, keeping existing token"
                );
                return unchanged;
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                athlete_id = record.athlete_id,
                status = %status,
                body = %body,
                "Token refresh rejected, keeping existing token"
            );
            return unchanged;
        }

        match response.json::<TokenRefreshResponse>().await {
            Ok(tok) => TokenRefresh {
                access_token: tok.access_token,
                refresh_token: tok.refresh_token,
                expires_at: tok.expires_at,
                refreshed: true,
            },
            Err(e) => {
                tracing::warn!(
                    athlete_id = record.athlete_id,
                    error = %e,
                    "Token refresh response unparsable, keeping existing token"
                );
                unchanged
            }
        }
    }

    /// Exchange an OAuth authorization code for tokens and athlete profile.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchangeResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::StravaApi(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Strava token exchange failed");
            return Err(AppError::StravaApi(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::StravaApi(format!("Failed to parse token response: {}", e)))
    }

    /// List activities in `(after, before)` with paging.
    ///
    /// Pages until a short page is returned. HTTP 429 sleeps the configured
    /// backoff and retries the same page; a short delay between successful
    /// pages keeps us under Strava's rate limit.
    pub async fn list_activities(
        &self,
        access_token: &str,
        after: i64,
        before: i64,
    ) -> Result<Vec<ActivitySummary>, AppError> {
        let url = format!("{}/athlete/activities", self.base_url);
        let mut activities = Vec::new();
        let mut page: u32 = 1;

        loop {
            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .query(&[
                    ("after", after.to_string()),
                    ("before", before.to_string()),
                    ("per_page", self.per_page.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await
                .map_err(|e| AppError::StravaApi(e.to_string()))?;

            if response.status().as_u16() == 429 {
                tracing::warn!(page, "Strava rate limit hit, backing off");
                tokio::time::sleep(self.rate_limit_backoff).await;
                continue;
            }
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
            }

            let batch: Vec<ActivitySummary> = response
                .json()
                .await
                .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))?;

            let short_page = batch.len() < self.per_page as usize;
            activities.extend(batch);
            tokio::time::sleep(self.request_delay).await;

            if short_page {
                break;
            }
            page += 1;
        }

        Ok(activities)
    }

    /// Fetch per-lap data for one activity.
    ///
    /// 404 means Strava has no lap data; that is an empty list, which the
    /// validity filter maps to invalid. 429 backs off and retries.
    pub async fn list_laps(
        &self,
        access_token: &str,
        activity_id: u64,
    ) -> Result<Vec<Lap>, AppError> {
        let url = format!("{}/activities/{}/laps", self.base_url, activity_id);

        loop {
            let response = self
                .http
                .get(&url)
                .bearer_auth(access_token)
                .send()
                .await
                .map_err(|e| AppError::StravaApi(e.to_string()))?;

            if response.status().as_u16() == 404 {
                return Ok(Vec::new());
            }
            if response.status().as_u16() == 429 {
                tracing::warn!(activity_id, "Strava rate limit hit on laps, backing off");
                tokio::time::sleep(self.rate_limit_backoff).await;
                continue;
            }
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::StravaApi(format!("HTTP {}: {}", status, body)));
            }

            let laps = response
                .json()
                .await
                .map_err(|e| AppError::StravaApi(format!("JSON parse error: {}", e)))?;
            tokio::time::sleep(self.request_delay).await;
            return Ok(laps);
        }
    }

    /// URL the landing page sends athletes to for authorization.
    pub fn authorize_url(&self, redirect_uri: &str) -> String {
        format!(
            "https://www.strava.com/oauth/authorize?client_id={}&response_type=code&redirect_uri={}&approval_prompt=auto&scope=read,activity:read_all",
            self.client_id,
            urlencoding::encode(redirect_uri)
        )
    }
}

/// Result of a token refresh attempt; mirrors the original credentials when
/// nothing was (or could be) refreshed.
#[derive(Debug, Clone)]
pub struct TokenRefresh {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    pub refreshed: bool,
}

/// Token refresh response from Strava.
#[derive(Debug, Clone, Deserialize)]
struct TokenRefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_at: i64,
}

/// Token exchange response from Strava OAuth (includes athlete info).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchangeResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: i64,
    /// Granted scope; Strava sends a string, some proxies send a list.
    #[serde(default)]
    pub scope: Option<serde_json::Value>,
    pub athlete: StravaAthlete,
}

impl TokenExchangeResponse {
    /// Granted scope as a comma-separated string.
    pub fn scope_string(&self) -> String {
        match &self.scope {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(","),
            _ => String::new(),
        }
    }
}

/// Athlete info from OAuth token exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct StravaAthlete {
    pub id: u64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
}

/// Summary activity from the list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySummary {
    pub id: u64,
    pub name: String,
    /// Strava's legacy `type` field ("Run", "TrailRun", "Ride", ...)
    #[serde(rename = "type")]
    pub sport_type: String,
    /// UTC start time, RFC 3339 with `Z` suffix
    pub start_date: String,
    /// Distance in meters
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub map: Option<ActivityMap>,
}

impl ActivitySummary {
    pub fn summary_polyline(&self) -> Option<String> {
        self.map.as_ref().and_then(|m| m.summary_polyline.clone())
    }
}

/// Activity map data; only the compressed summary polyline is kept.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivityMap {
    pub summary_polyline: Option<String>,
}

/// One lap of an activity; only the average speed matters for validity.
#[derive(Debug, Clone, Deserialize)]
pub struct Lap {
    pub average_speed: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_summary_wire_format() {
        let json = r#"{
            "id": 123456,
            "name": "Evening Run",
            "type": "Run",
            "start_date": "2025-11-04T22:15:00Z",
            "distance": 5230.4,
            "map": {"summary_polyline": "abc~xyz"}
        }"#;
        let act: ActivitySummary = serde_json::from_str(json).unwrap();
        assert_eq!(act.sport_type, "Run");
        assert_eq!(act.distance, 5230.4);
        assert_eq!(act.summary_polyline().as_deref(), Some("abc~xyz"));
    }

    #[test]
    fn test_activity_summary_without_map() {
        let json = r#"{
            "id": 1,
            "name": "Treadmill",
            "type": "Run",
            "start_date": "2025-11-04T22:15:00Z"
        }"#;
        let act: ActivitySummary = serde_json::from_str(json).unwrap();
        assert_eq!(act.distance, 0.0);
        assert!(act.summary_polyline().is_none());
    }

    #[test]
    fn test_lap_missing_speed() {
        let laps: Vec<Lap> =
            serde_json::from_str(r#"[{"average_speed": 2.8}, {}]"#).unwrap();
        assert_eq!(laps[0].average_speed, Some(2.8));
        assert_eq!(laps[1].average_speed, None);
    }

    #[test]
    fn test_scope_string_variants() {
        let mk = |scope: serde_json::Value| TokenExchangeResponse {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: 0,
            scope: Some(scope),
            athlete: StravaAthlete {
                id: 1,
                firstname: String::new(),
                lastname: String::new(),
            },
        };

        assert_eq!(
            mk(serde_json::json!("read,activity:read_all")).scope_string(),
            "read,activity:read_all"
        );
        assert_eq!(
            mk(serde_json::json!(["read", "activity:read_all"])).scope_string(),
            "read,activity:read_all"
        );
    }
}
