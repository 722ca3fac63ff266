// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Landing page and Strava OAuth callback.
//!
//! Strava redirects back to `/` with a `code` query parameter; without one
//! the page just links to the authorization URL.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::services::RegistrationService;
use crate::store::TokenStore;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/", get(landing))
}

/// Query parameters Strava appends on the OAuth redirect.
#[derive(Deserialize)]
pub struct LandingParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

async fn landing(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LandingParams>,
) -> Result<Html<String>> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth authorization denied");
        return Ok(Html(format!(
            "<h1>Error!</h1><p>Strava authorization failed: {}</p>",
            error
        )));
    }

    if let Some(code) = params.code {
        std::fs::create_dir_all(&state.config.data_dir)?;
        let service = RegistrationService::new(
            state.strava.clone(),
            TokenStore::new(state.config.tokens_path()),
        );
        return match service.register(&code).await {
            Ok(record) => Ok(Html(format!(
                "<h1>Success!</h1><p>Thanks {} for registering.</p>",
                record.display_name()
            ))),
            Err(e) => {
                tracing::error!(error = %e, "Athlete registration failed");
                Ok(Html(format!(
                    "<h1>Error!</h1><p>Failed to register athlete: {}</p>",
                    e
                )))
            }
        };
    }

    let auth_url = state.strava.authorize_url(&state.config.redirect_uri);
    Ok(Html(format!(
        "<h1>Running Challenge Registration</h1>\n<a href=\"{}\">Authorize on Strava</a>",
        auth_url
    )))
}
