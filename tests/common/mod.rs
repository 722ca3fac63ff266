// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fake of the Strava endpoints the pipeline talks to.
//!
//! Bound to an ephemeral localhost port; point `Config::api_base_url` (and
//! `Config::oauth_token_url`) at `FakeStrava::start()` to run the real
//! client against it.

use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use challenge_tracker::config::Config;

/// A canned activity visible to `/athlete/activities`.
#[derive(Clone)]
pub struct FakeActivity {
    pub id: u64,
    pub name: &'static str,
    pub sport_type: &'static str,
    pub start_date: &'static str,
    pub distance_meters: f64,
    /// Lap average speeds; `None` means the laps endpoint returns 404.
    pub lap_speeds: Option<Vec<f64>>,
}

/// Canned response from the fake token endpoint.
#[derive(Clone)]
pub struct TokenGrant {
    pub access_token: &'static str,
    pub refresh_token: &'static str,
    pub expires_at: i64,
}

#[derive(Clone, Default)]
pub struct FakeStrava {
    /// Keyed by bearer token, so each athlete sees their own activities.
    pub activities: HashMap<String, Vec<FakeActivity>>,
    /// Tokens whose listing request fails with HTTP 500.
    pub broken_tokens: Vec<String>,
    /// What `/oauth/token` answers a refresh with; `None` rejects with 400.
    pub token_grant: Option<TokenGrant>,
    /// Listing requests still to be answered with HTTP 429.
    pub throttle_activities: Arc<AtomicU32>,
    /// Lap requests still to be answered with HTTP 429.
    pub throttle_laps: Arc<AtomicU32>,
    /// Requests seen by the listing endpoint, 429s included.
    pub list_hits: Arc<AtomicU32>,
    /// Requests seen by the token endpoint.
    pub token_hits: Arc<AtomicU32>,
}

impl FakeStrava {
    /// Serve on an ephemeral port; returns the base URL.
    pub async fn start(self) -> String {
        let shared = Arc::new(self);
        let app = Router::new()
            .route("/athlete/activities", get(list_activities))
            .route("/activities/{id}/laps", get(list_laps))
            .route("/oauth/token", post(grant_token))
            .with_state(shared);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

fn bearer(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string()
}

fn epoch_of(start_date: &str) -> i64 {
    chrono::DateTime::parse_from_rfc3339(start_date)
        .expect("fake activity start_date")
        .timestamp()
}

/// Consume one unit of a 429 budget; true while budget remains.
fn take_one(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

async fn list_activities(
    State(state): State<Arc<FakeStrava>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.list_hits.fetch_add(1, Ordering::SeqCst);
    if take_one(&state.throttle_activities) {
        return (StatusCode::TOO_MANY_REQUESTS, Json(serde_json::json!({}))).into_response();
    }

    let token = bearer(&headers);
    if state.broken_tokens.iter().any(|t| *t == token) {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({}))).into_response();
    }

    let after: i64 = params.get("after").and_then(|v| v.parse().ok()).unwrap_or(0);
    let before: i64 = params
        .get("before")
        .and_then(|v| v.parse().ok())
        .unwrap_or(i64::MAX);
    let per_page: usize = params
        .get("per_page")
        .and_then(|v| v.parse().ok())
        .unwrap_or(100);
    let page: usize = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1);

    let matching: Vec<serde_json::Value> = state
        .activities
        .get(&token)
        .into_iter()
        .flatten()
        .filter(|a| {
            let epoch = epoch_of(a.start_date);
            epoch >= after && epoch <= before
        })
        .map(|a| {
            serde_json::json!({
                "id": a.id,
                "name": a.name,
                "type": a.sport_type,
                "start_date": a.start_date,
                "distance": a.distance_meters,
                "map": {"summary_polyline": "fake~line"}
            })
        })
        .collect();

    let batch: Vec<serde_json::Value> = matching
        .chunks(per_page.max(1))
        .nth(page.saturating_sub(1))
        .unwrap_or(&[])
        .to_vec();

    Json(batch).into_response()
}

async fn list_laps(
    State(state): State<Arc<FakeStrava>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    if take_one(&state.throttle_laps) {
        return (StatusCode::TOO_MANY_REQUESTS, Json(serde_json::json!({}))).into_response();
    }

    let token = bearer(&headers);
    let activity = state
        .activities
        .get(&token)
        .into_iter()
        .flatten()
        .find(|a| a.id == id);

    match activity.and_then(|a| a.lap_speeds.as_ref()) {
        Some(speeds) => {
            let laps: Vec<serde_json::Value> = speeds
                .iter()
                .map(|s| serde_json::json!({"average_speed": s}))
                .collect();
            Json(laps).into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response(),
    }
}

async fn grant_token(
    State(state): State<Arc<FakeStrava>>,
    Form(params): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    state.token_hits.fetch_add(1, Ordering::SeqCst);

    if params.get("grant_type").map(String::as_str) != Some("refresh_token") {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "unsupported grant"})),
        )
            .into_response();
    }

    match &state.token_grant {
        Some(grant) => Json(serde_json::json!({
            "access_token": grant.access_token,
            "refresh_token": grant.refresh_token,
            "expires_at": grant.expires_at,
        }))
        .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"message": "invalid refresh token"})),
        )
            .into_response(),
    }
}

/// Test config pointed at the fake server with fast pacing.
pub fn test_config(base_url: &str, data_dir: &std::path::Path) -> Config {
    let mut config = Config::default().with_data_dir(data_dir);
    config.api_base_url = base_url.to_string();
    config.oauth_token_url = format!("{}/oauth/token", base_url);
    config.request_delay = Duration::from_millis(1);
    config.rate_limit_backoff = Duration::from_millis(5);
    config
}
