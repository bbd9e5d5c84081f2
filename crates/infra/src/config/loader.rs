//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `BQSTREAM_PROJECT_ID`: Project owning the dataset and running jobs
//! - `BQSTREAM_DATASET_ID`: Dataset for inserts, provisioning and queries
//! - `BQSTREAM_SERVICE_ACCOUNT`: Issuer identity used when minting tokens
//! - `BQSTREAM_KEY_PATH`: Path to the service account key, or
//! - `BQSTREAM_KEY`: The key material itself
//! - `BQSTREAM_TABLE_ID`: Default table (optional)
//! - `BQSTREAM_BASE_URL`: Service root (optional)
//! - `BQSTREAM_STOP_ON_ERROR`: Disable auth retries (true/false)
//! - `BQSTREAM_RESULTS_PATH`: `destination_table` or `query_endpoint`
//! - `BQSTREAM_LOG_LEVEL`, `BQSTREAM_LOG_FORMAT`: Logging defaults
//!
//! ## File Locations
//! The loader probes, in order, `config.{json,toml}` and
//! `bqstream.{json,toml}` in the working directory, its parent, and next to
//! the executable.

use std::path::{Path, PathBuf};

use bqstream_domain::{BqError, ClientConfig, KeySource, LogFormat, ResultsPath, Result};

/// Environment variable holding inline key material
pub const KEY_ENV_VAR: &str = "BQSTREAM_KEY";

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `BqError::Config` if neither source yields a valid config.
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `BqError::Config` if a required variable is missing or a value
/// does not parse.
pub fn load_from_env() -> Result<ClientConfig> {
    let project_id = env_var("BQSTREAM_PROJECT_ID")?;
    let dataset_id = env_var("BQSTREAM_DATASET_ID")?;
    let service_account = env_var("BQSTREAM_SERVICE_ACCOUNT")?;

    let key = match std::env::var("BQSTREAM_KEY_PATH") {
        Ok(path) => KeySource::File { path: PathBuf::from(path) },
        Err(_) if std::env::var_os(KEY_ENV_VAR).is_some() => {
            KeySource::Environment { var_name: KEY_ENV_VAR.to_string() }
        }
        Err(_) => {
            return Err(BqError::Config(format!(
                "Missing required environment variable: BQSTREAM_KEY_PATH or {KEY_ENV_VAR}"
            )))
        }
    };

    let mut config = ClientConfig::new(project_id, dataset_id, service_account, key);
    config.table_id = std::env::var("BQSTREAM_TABLE_ID").ok();
    if let Ok(base_url) = std::env::var("BQSTREAM_BASE_URL") {
        config.base_url = base_url;
    }
    config.stop_on_error = env_bool("BQSTREAM_STOP_ON_ERROR", false);
    if let Ok(path) = std::env::var("BQSTREAM_RESULTS_PATH") {
        config.query.results_path = path.parse::<ResultsPath>()?;
    }
    if let Ok(level) = std::env::var("BQSTREAM_LOG_LEVEL") {
        config.log.level = level;
    }
    if let Ok(format) = std::env::var("BQSTREAM_LOG_FORMAT") {
        config.log.format = format.parse::<LogFormat>()?;
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. The format follows
/// the file extension.
///
/// # Errors
/// Returns `BqError::Config` if the file is missing, unreadable, malformed
/// or fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BqError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BqError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BqError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BqError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BqError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(BqError::Config(format!("Unsupported config format: {extension}"))),
    }
}

const CONFIG_NAMES: [&str; 4] = ["config.json", "config.toml", "bqstream.json", "bqstream.toml"];

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        let parent = cwd.join("..");
        dirs.push(cwd);
        dirs.push(parent);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| BqError::Config(format!("Missing required environment variable: {key}")))
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
