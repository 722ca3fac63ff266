// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod aggregate;
pub mod filter;
pub mod ingest;
pub mod register;
pub mod report;
pub mod strava;

pub use ingest::{IngestOutcome, IngestService};
pub use register::RegistrationService;
pub use report::ReportWriter;
pub use strava::StravaClient;
