// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Report trigger endpoint: run the pipeline, hand back a zip of the
//! current report files.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::io::Write;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::IngestService;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/reports", get(download_reports))
}

/// Run ingestion end to end and return `reports.zip`.
async fn download_reports(State(state): State<Arc<AppState>>) -> Result<Response> {
    let service = IngestService::new(state.strava.clone(), state.config.clone());
    service.run_to_files().await?;

    let bytes = bundle_reports(&state.config)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"reports.zip\"",
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Zip whichever of the three report files exist.
///
/// A report with no rows is never written, so missing members are expected;
/// only an entirely empty bundle is an error.
fn bundle_reports(config: &Config) -> Result<Vec<u8>> {
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut bundled = 0;
    for path in [
        config.leaderboard_path(),
        config.daily_path(),
        config.invalid_path(),
    ] {
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| AppError::Storage(format!("bad report path: {}", path.display())))?;
        zip.start_file(name, options)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("zip error: {}", e)))?;
        zip.write_all(&std::fs::read(&path)?)?;
        bundled += 1;
    }

    if bundled == 0 {
        return Err(AppError::NotFound(
            "no report files have been produced yet".to_string(),
        ));
    }

    let cursor = zip
        .finish()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("zip error: {}", e)))?;
    Ok(cursor.into_inner())
}
