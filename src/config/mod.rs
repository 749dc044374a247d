// fdcsync/src/config/mod.rs
use clap::Args;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::errors::{Result, SyncError};
use crate::sync::assemble::PortionKey;

pub const DEFAULT_DATABASE_PATH: &str = "./food-data.sqlite3";

/// Options for `fdcsync add`. Every setting is optional here so that flags,
/// environment and the JSON config file can be layered in `SyncConfig::resolve`.
#[derive(Debug, Clone, Default, Args)]
pub struct SyncOptions {
    /// FoodData Central ids to add (or overwrite)
    #[arg(value_name = "FDC_IDS")]
    pub fdc_ids: Vec<String>,

    /// Source sqlite3 database file path [default: ./food-data.sqlite3]
    #[arg(long, env = "FDCSYNC_DB")]
    pub db: Option<PathBuf>,

    /// API base uri
    #[arg(long, env = "OMHH_API_URI")]
    pub api: Option<String>,

    /// API token
    #[arg(long, env = "OMHH_API_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// File of fdc ids, one per line
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// File of manual portions: fdc_id, gram_weight, unit, modifier
    #[arg(long)]
    pub portions: Option<PathBuf>,

    /// How portions are keyed and ordered on each document
    #[arg(long, value_enum)]
    pub portion_key: Option<PortionKey>,

    /// JSON config file supplying defaults for any of the above
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print the assembled batch instead of uploading it
    #[arg(long)]
    pub dry_run: bool,
}

/// Shape of the optional JSON config file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawJsonConfig {
    pub database_path: Option<PathBuf>,
    pub api_uri: Option<String>,
    pub api_token: Option<String>,
    pub id_file: Option<PathBuf>,
    pub portions_file: Option<PathBuf>,
    pub portion_key: Option<PortionKey>,
}

impl RawJsonConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(config_path).map_err(|e| SyncError::io(config_path, e))?;
        serde_json::from_str(&content).map_err(|e| {
            SyncError::Config(format!(
                "Failed to parse JSON from config file at {}: {}",
                config_path.display(),
                e
            ))
        })
    }
}

#[derive(Clone, PartialEq)]
pub struct ApiConfig {
    pub base_uri: String,
    pub token: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_uri", &self.base_uri)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub database_path: PathBuf,
    /// `None` only in dry-run mode.
    pub api: Option<ApiConfig>,
    pub fdc_ids: Vec<String>,
    pub id_file: Option<PathBuf>,
    pub portions_file: Option<PathBuf>,
    pub portion_key: PortionKey,
    pub dry_run: bool,
}

impl SyncConfig {
    /// Layers flag/env values (already merged by clap) over the JSON config
    /// file and built-in defaults, then validates the result.
    pub fn resolve(options: SyncOptions) -> Result<Self> {
        let file_config = match &options.config {
            Some(path) => RawJsonConfig::load_from_json(path)?,
            None => RawJsonConfig::default(),
        };
        Self::merge(options, file_config)
    }

    fn merge(options: SyncOptions, file_config: RawJsonConfig) -> Result<Self> {
        let database_path = options
            .db
            .or(file_config.database_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));
        let api_uri = non_empty(options.api).or_else(|| non_empty(file_config.api_uri));
        let api_token = non_empty(options.token).or_else(|| non_empty(file_config.api_token));

        let api = match (api_uri, api_token) {
            (Some(base_uri), Some(token)) => {
                validate_api_uri(&base_uri)?;
                Some(ApiConfig { base_uri, token })
            }
            _ if options.dry_run => None,
            (None, _) => {
                return Err(SyncError::Config(
                    "API uri must be set with --api, OMHH_API_URI or api_uri in the config file"
                        .to_string(),
                ));
            }
            (_, None) => {
                return Err(SyncError::Config(
                    "API token must be set with --token, OMHH_API_TOKEN or api_token in the config file"
                        .to_string(),
                ));
            }
        };

        Ok(SyncConfig {
            database_path,
            api,
            fdc_ids: options.fdc_ids,
            id_file: options.file.or(file_config.id_file),
            portions_file: options.portions.or(file_config.portions_file),
            portion_key: options
                .portion_key
                .or(file_config.portion_key)
                .unwrap_or_default(),
            dry_run: options.dry_run,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn validate_api_uri(base_uri: &str) -> Result<()> {
    let parsed = Url::parse(base_uri)
        .map_err(|e| SyncError::Config(format!("Invalid API uri {}: {}", base_uri, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(SyncError::Config(format!(
            "API uri must use http or https, got '{}'",
            other
        ))),
    }
}
