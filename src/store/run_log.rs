// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable, deduplicated log of every activity ever judged valid.
//!
//! This is the system's source of truth for aggregation: reports are
//! recomputed from the whole log on every run, so a re-fetched activity
//! simply overwrites its previous entry instead of double counting.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::ValidRun;

/// In-memory valid-run log, bucketed athlete → activity → run.
///
/// `BTreeMap` keeps the on-disk row order deterministic across runs.
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    runs: BTreeMap<u64, BTreeMap<u64, ValidRun>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `(athlete_id, activity_id)`.
    ///
    /// Last write wins; merging the same activity twice is idempotent.
    pub fn upsert(&mut self, run: ValidRun) {
        self.runs
            .entry(run.athlete_id)
            .or_default()
            .insert(run.activity_id, run);
    }

    /// All logged runs for one athlete, ordered by activity ID.
    pub fn runs_for(&self, athlete_id: u64) -> impl Iterator<Item = &ValidRun> {
        self.runs.get(&athlete_id).into_iter().flatten().map(|(_, run)| run)
    }

    /// All logged runs across athletes, in (athlete, activity) order.
    pub fn iter(&self) -> impl Iterator<Item = &ValidRun> {
        self.runs.values().flat_map(|bucket| bucket.values())
    }

    pub fn len(&self) -> usize {
        self.runs.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.values().all(BTreeMap::is_empty)
    }
}

/// Repository over `valid_runs_log.csv`.
#[derive(Debug, Clone)]
pub struct RunLogStore {
    path: PathBuf,
}

impl RunLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full log. A missing file is an empty log.
    pub fn load(&self) -> Result<RunLog> {
        if !self.path.exists() {
            return Ok(RunLog::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut log = RunLog::new();
        for row in reader.deserialize() {
            let run: ValidRun = row?;
            log.upsert(run);
        }
        Ok(log)
    }

    /// Rewrite the whole file from the in-memory log. No-op when empty.
    pub fn save_all(&self, log: &RunLog) -> Result<()> {
        if log.is_empty() {
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for run in log.iter() {
            writer.serialize(run)?;
        }
        writer.flush()?;
        Ok(())
    }
}
