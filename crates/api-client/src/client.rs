use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use tornwatch_core::TargetId;

/// Typed HTTP client for the Torn API.
///
/// Covers the single call tornwatch needs: the basic-selection user lookup
/// that carries the `last_action` block. The Torn API reports application
/// errors in the response body (with HTTP 200), so outcomes are classified
/// from the parsed body rather than the status code; only transport and
/// parse failures surface as `Err`.
pub struct TornClient {
    client: reqwest::Client,
    base_url: String,
}

impl TornClient {
    /// Create a new client with the given base URL and per-request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn user_url(&self, target: &TargetId, api_key: &str) -> String {
        format!(
            "{}/user/{}?selections=basic&key={}",
            self.base_url,
            target,
            urlencoding::encode(api_key),
        )
    }

    /// Fetch the target's last-action record and classify the outcome.
    pub async fn fetch_last_action(
        &self,
        target: &TargetId,
        api_key: &str,
    ) -> Result<FetchOutcome> {
        let resp = self
            .client
            .get(self.user_url(target, api_key))
            .send()
            .await
            .with_context(|| format!("last-action request for target {target} failed"))?;

        let body: UserResponse = resp
            .json()
            .await
            .context("failed to parse last-action response body")?;

        Ok(classify(body))
    }
}

/// Result of one last-action fetch, classified from the response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Epoch seconds of the target's last action.
    LastAction(i64),
    /// The API returned a structured error (bad key, wrong id, ...).
    ApiError(String),
    /// Well-formed response without a usable `last_action.timestamp`.
    NoData,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    error: Option<ApiErrorBody>,
    last_action: Option<LastActionBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: Option<i64>,
    error: String,
}

#[derive(Debug, Deserialize)]
struct LastActionBody {
    timestamp: Option<i64>,
}

fn classify(body: UserResponse) -> FetchOutcome {
    if let Some(err) = body.error {
        debug!("Torn API error (code {:?}): {}", err.code, err.error);
        return FetchOutcome::ApiError(err.error);
    }

    match body.last_action.and_then(|la| la.timestamp) {
        Some(ts) => FetchOutcome::LastAction(ts),
        None => FetchOutcome::NoData,
    }
}
