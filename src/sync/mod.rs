// fdcsync/src/sync/mod.rs
pub(crate) mod assemble;
pub(crate) mod logic;
pub(crate) mod overrides;
pub(crate) mod sources;
pub(crate) mod store;
pub(crate) mod submit;

use anyhow::Result;
use crate::config::{SyncConfig, SyncOptions};

pub use logic::{SyncReport, UploadOutcome};

/// Public entry point for `add`: resolves configuration, then runs the sync.
pub async fn run_sync_flow(options: SyncOptions) -> Result<SyncReport> {
    let sync_config = SyncConfig::resolve(options)?;
    tracing::debug!("Sync configuration: {:?}", sync_config);
    logic::perform_sync_orchestration(&sync_config).await
}
