// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Athlete registration: OAuth code exchange into the credential store.

use crate::error::Result;
use crate::models::TokenRecord;
use crate::services::strava::StravaClient;
use crate::store::TokenStore;

/// Exchanges authorization codes and bootstraps credential records.
pub struct RegistrationService {
    client: StravaClient,
    tokens: TokenStore,
}

impl RegistrationService {
    pub fn new(client: StravaClient, tokens: TokenStore) -> Self {
        Self { client, tokens }
    }

    /// Exchange `code` for tokens and append the athlete to the credential
    /// store with a zero watermark.
    ///
    /// A re-registration appends a second row; load-time dedup keeps the
    /// first occurrence, so existing watermarks are never clobbered.
    pub async fn register(&self, code: &str) -> Result<TokenRecord> {
        let exchange = self.client.exchange_code(code).await?;

        let record = TokenRecord {
            athlete_id: exchange.athlete.id,
            firstname: exchange.athlete.firstname.clone(),
            lastname: exchange.athlete.lastname.clone(),
            access_token: exchange.access_token.clone(),
            refresh_token: exchange.refresh_token.clone(),
            expires_at: exchange.expires_at,
            scope: exchange.scope_string(),
            latest_activity_epoch: 0,
        };

        self.tokens.append(&record)?;

        tracing::info!(
            athlete_id = record.athlete_id,
            name = %record.display_name(),
            "Registered athlete"
        );
        Ok(record)
    }
}
