// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report artifact serialization.
//!
//! Column order is part of the contract with downstream spreadsheet
//! consumers; it is fixed by the serde field order of the row structs.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::Result;
use crate::models::{DailyRow, InvalidRun, LeaderboardRow};

/// Writes the three derived report files into the data directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    leaderboard_path: PathBuf,
    daily_path: PathBuf,
    invalid_path: PathBuf,
}

impl ReportWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            leaderboard_path: config.leaderboard_path(),
            daily_path: config.daily_path(),
            invalid_path: config.invalid_path(),
        }
    }

    /// Write all three reports. An empty row set writes no file, matching the
    /// credential/log stores' never-truncate discipline.
    pub fn write_all(
        &self,
        leaderboard: &[LeaderboardRow],
        daily: &[DailyRow],
        invalid: &[InvalidRun],
    ) -> Result<()> {
        write_rows(&self.leaderboard_path, leaderboard)?;
        write_rows(&self.daily_path, daily)?;
        write_rows(&self.invalid_path, invalid)?;
        tracing::info!(
            leaderboard_rows = leaderboard.len(),
            daily_rows = daily.len(),
            invalid_rows = invalid.len(),
            "Reports written"
        );
        Ok(())
    }
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
