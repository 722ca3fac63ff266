// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! CSV-backed credential store.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::PathBuf;

use crate::error::Result;
use crate::models::TokenRecord;

/// Repository over `tokens.csv`.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load all token records.
    ///
    /// A missing file is an empty store. Duplicate athlete IDs are dropped
    /// with a warning; the first occurrence wins.
    pub fn load_all(&self) -> Result<Vec<TokenRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        for row in reader.deserialize() {
            let record: TokenRecord = row?;
            if !seen.insert(record.athlete_id) {
                tracing::warn!(
                    athlete_id = record.athlete_id,
                    "Duplicate athlete in tokens.csv, skipping duplicate"
                );
                continue;
            }
            records.push(record);
        }
        Ok(records)
    }

    /// Rewrite the whole file with the given records. No-op when empty, so a
    /// run that loaded nothing never truncates an existing file.
    pub fn save_all(&self, records: &[TokenRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut writer = csv::Writer::from_path(&self.path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Append a single record (registration bootstrap). Creates the file with
    /// a header row when absent.
    pub fn append(&self, record: &TokenRecord) -> Result<()> {
        let new_file = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(new_file)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }
}
