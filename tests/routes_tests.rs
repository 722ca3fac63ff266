// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route tests over a live server socket, using the shared application
//! state the binary builds at startup.

mod common;

use common::{test_config, FakeActivity, FakeStrava};

use challenge_tracker::config::Config;
use challenge_tracker::models::TokenRecord;
use challenge_tracker::routes::create_router;
use challenge_tracker::services::StravaClient;
use challenge_tracker::store::TokenStore;
use challenge_tracker::AppState;
use std::sync::Arc;

/// Serve the full router on an ephemeral port; returns the base URL.
async fn serve(config: Config) -> String {
    let state = Arc::new(AppState {
        strava: StravaClient::new(&config),
        config,
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let url = serve(test_config("http://127.0.0.1:1", dir.path())).await;

    let body: serde_json::Value = reqwest::get(format!("{}/health", url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_landing_page_links_to_authorization() {
    let dir = tempfile::tempdir().unwrap();
    let url = serve(test_config("http://127.0.0.1:1", dir.path())).await;

    let response = reqwest::get(format!("{}/", url)).await.unwrap();
    assert!(response.status().is_success());

    let body = response.text().await.unwrap();
    assert!(body.contains("https://www.strava.com/oauth/authorize"));
    assert!(body.contains("client_id=test_client_id"));
}

#[tokio::test]
async fn test_reports_endpoint_returns_zip_bundle() {
    let fake = FakeStrava {
        activities: [(
            "token-a".to_string(),
            vec![FakeActivity {
                id: 401,
                name: "Morning Run",
                sport_type: "Run",
                start_date: "2025-11-12T12:00:00Z",
                distance_meters: 7000.0,
                lap_speeds: Some(vec![3.0]),
            }],
        )]
        .into_iter()
        .collect(),
        ..FakeStrava::default()
    };
    let base_url = fake.start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&base_url, dir.path());

    TokenStore::new(config.tokens_path())
        .append(&TokenRecord {
            athlete_id: 1,
            firstname: "An".to_string(),
            lastname: "Nguyen".to_string(),
            access_token: "token-a".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 4102444800,
            scope: "read,activity:read_all".to_string(),
            latest_activity_epoch: 0,
        })
        .unwrap();

    let url = serve(config).await;
    let response = reqwest::get(format!("{}/reports", url)).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "application/zip"
    );

    let bytes = response.bytes().await.unwrap();
    let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.to_vec())).unwrap();
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.contains(&"leaderboard.csv"));
    assert!(names.contains(&"daily_km.csv"));
}
