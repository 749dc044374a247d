// fdcsync/src/sync/logic.rs
use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::models::MutationBatch;
use crate::sync::assemble::{PortionKey, assemble_document};
use crate::sync::overrides::{PortionOverrides, load_portion_overrides};
use crate::sync::sources::resolve_fdc_ids;
use crate::sync::store::FoodStore;
use crate::sync::submit::submit_batch;

/// What happened to the assembled batch.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Uploaded(usize),
    /// Nothing was assembled, so nothing was sent.
    Skipped,
    DryRun,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub requested: usize,
    pub assembled: usize,
    pub upload: UploadOutcome,
}

/// Fetches and assembles one document per id, in id order. Ids without a
/// food row are left out; nothing here can fail the run.
pub async fn build_batch(
    store: &FoodStore,
    fdc_ids: &[String],
    overrides: &PortionOverrides,
    portion_key: PortionKey,
) -> MutationBatch {
    let total = fdc_ids.len();
    let mut documents = Vec::with_capacity(total);

    for (i, fdc_id) in fdc_ids.iter().enumerate() {
        info!("processing {} of {}", i + 1, total);
        let fetched = store.fetch(fdc_id).await;
        let manual = overrides.get(fdc_id).map(Vec::as_slice).unwrap_or_default();
        if let Some(doc) = assemble_document(fdc_id, fetched, manual, portion_key) {
            documents.push(doc);
        }
    }

    MutationBatch::from_documents(documents)
}

/// Runs one `add`: resolve ids, read the store, assemble, upload.
///
/// Input files and the database must be readable or the run stops before
/// anything is sent. Upload problems are logged and reported, not returned.
pub async fn perform_sync_orchestration(sync_config: &SyncConfig) -> Result<SyncReport> {
    let overrides = match &sync_config.portions_file {
        Some(path) => load_portion_overrides(path)
            .with_context(|| format!("Failed to load portion overrides from {}", path.display()))?,
        None => PortionOverrides::new(),
    };

    let fdc_ids = resolve_fdc_ids(
        &sync_config.fdc_ids,
        sync_config.id_file.as_deref(),
        sync_config.portions_file.as_ref().map(|_| &overrides),
    )
    .context("Failed to resolve fdc ids")?;

    let store = FoodStore::open(&sync_config.database_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open food database {}",
                sync_config.database_path.display()
            )
        })?;
    let batch = build_batch(&store, &fdc_ids, &overrides, sync_config.portion_key).await;
    store.close().await;
    info!("processing complete.");

    let assembled = batch.len();
    let upload = if sync_config.dry_run {
        let rendered =
            serde_json::to_string_pretty(&batch).context("Failed to serialize mutation batch")?;
        println!("{}", rendered);
        UploadOutcome::DryRun
    } else if batch.is_empty() {
        warn!("⚠️ No foods were assembled, nothing to upload.");
        UploadOutcome::Skipped
    } else {
        let api = sync_config
            .api
            .as_ref()
            .context("API settings are required unless --dry-run is given")?;
        match submit_batch(api, batch).await {
            Ok(report) => {
                info!("Uploaded {} foods", report.submitted);
                info!("{}", report.response);
                UploadOutcome::Uploaded(report.submitted)
            }
            Err(e) => {
                error!("❌ Upload failed: {}", e);
                UploadOutcome::Failed(e.to_string())
            }
        }
    };

    Ok(SyncReport {
        requested: fdc_ids.len(),
        assembled,
        upload,
    })
}
