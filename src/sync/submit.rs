// fdcsync/src/sync/submit.rs
use reqwest::Client;
use tracing::info;

use crate::config::ApiConfig;
use crate::errors::{Result, SyncError};
use crate::models::MutationBatch;

pub const MUTATE_PATH: &str = "data/mutate/production";

/// What the API said about an accepted batch.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitReport {
    pub submitted: usize,
    pub response: serde_json::Value,
}

/// `{base}/data/mutate/production`, with one trailing slash on the base ignored.
pub fn mutate_endpoint(base_uri: &str) -> String {
    let base = base_uri.strip_suffix('/').unwrap_or(base_uri);
    format!("{}/{}", base, MUTATE_PATH)
}

/// Posts the whole batch as a single create-or-replace request. No retries.
pub async fn submit_batch(api: &ApiConfig, batch: MutationBatch) -> Result<SubmitReport> {
    let endpoint = mutate_endpoint(&api.base_uri);
    let submitted = batch.len();
    info!("Uploading {} documents to {}, this may take a minute...", submitted, endpoint);

    let response = Client::new()
        .post(&endpoint)
        .bearer_auth(&api.token)
        .json(&batch)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SyncError::Status { status, body });
    }

    let body = response.text().await?;
    let response: serde_json::Value = serde_json::from_str(&body)?;
    info!("✅ Uploaded {} foods", submitted);
    Ok(SubmitReport { submitted, response })
}
