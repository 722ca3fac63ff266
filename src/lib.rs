// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge-Tracker: Strava running-challenge ingestion and reporting.
//!
//! This crate ingests activities from Strava for registered athletes,
//! filters them against a lap-pace validity rule, merges valid runs into a
//! durable log, and recomputes capped daily totals and a leaderboard.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod time_utils;

use config::Config;
use services::StravaClient;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub strava: StravaClient,
}
