// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge-Tracker server
//!
//! Serves the Strava registration landing page and the report trigger
//! endpoint for a capped-distance running challenge.

use challenge_tracker::{config::Config, services::StravaClient, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(
        port = config.port,
        window_start = %config.window_start,
        window_end = %config.window_end,
        "Starting Challenge-Tracker"
    );

    // The data directory holds tokens.csv, the run log and the reports
    std::fs::create_dir_all(&config.data_dir)?;

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        strava: StravaClient::new(&config),
    });

    // Build router
    let app = challenge_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("challenge_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
