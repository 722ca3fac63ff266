// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod athlete;
pub mod report;
pub mod run;

pub use athlete::TokenRecord;
pub use report::{DailyRow, LeaderboardRow};
pub use run::{InvalidRun, ValidRun};
