//! Configuration loader
//!
//! Loads the sync configuration from a working directory or from environment
//! variables.
//!
//! ## Loading Strategy
//! 1. Probe the working directory for a config file
//! 2. If one is found, parse it (JSON or TOML by extension) and apply
//!    environment overrides on top
//! 3. Otherwise build the whole configuration from environment variables
//!
//! ## Environment Variables
//! - `QDM_BASE_URL`: API host (required when no file is used)
//! - `QDM_CLIENT_ID`: Client id (required when no file is used)
//! - `QDM_CLIENT_SECRET`: Client secret (required when no file is used)
//! - `QDM_DB_PATH`: SQLite database file (required when no file is used)
//! - `QDM_PAGE_SIZE`: Records per page request
//! - `QDM_BATCH_SIZE`: Records persisted per tick
//! - `QDM_TICK_INTERVAL_MS`: Interval between two fetches
//!
//! ## File Locations
//! Inside the working directory, in order: `config.toml`, `config.json`,
//! `qdm-sync.toml`, `qdm-sync.json`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use qdmsync_domain::constants::{DEFAULT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT};
use qdmsync_domain::{Config, PersistenceConfig, QdmConfig, QdmSyncError, Result, SyncConfig};

const CANDIDATES: [&str; 4] = ["config.toml", "config.json", "qdm-sync.toml", "qdm-sync.json"];

/// Load configuration for the given working directory
///
/// A config file inside `work_dir` wins, with environment overrides applied
/// on top; without one, the configuration comes entirely from the
/// environment.
///
/// # Errors
/// Returns `QdmSyncError::Config` if neither source yields a complete,
/// valid configuration.
pub fn load(work_dir: &Path) -> Result<Config> {
    match probe_config_paths(work_dir) {
        Some(path) => {
            let mut config = load_from_file(&path)?;
            apply_env_overrides(&mut config)?;
            Ok(config)
        }
        None => {
            tracing::debug!(dir = %work_dir.display(), "no config file found, using environment");
            let config = load_from_env()?;
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `QdmSyncError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config {
        qdm: QdmConfig {
            base_url: env_var("QDM_BASE_URL")?,
            client_id: env_var("QDM_CLIENT_ID")?,
            client_secret: env_var("QDM_CLIENT_SECRET")?,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        },
        persistence: PersistenceConfig { path: env_var("QDM_DB_PATH")?, pool_size: 4 },
        sync: SyncConfig::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `QdmSyncError::Config` if the file is missing, unreadable or
/// invalid.
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(QdmSyncError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| QdmSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Find the first config file inside `dir`.
pub fn probe_config_paths(dir: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|name| dir.join(name)).find(|path| path.is_file())
}

/// Override file values with any `QDM_*` variables that are set.
///
/// # Errors
/// Returns `QdmSyncError::Config` when a numeric override does not parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(value) = env_opt("QDM_BASE_URL") {
        config.qdm.base_url = value;
    }
    if let Some(value) = env_opt("QDM_CLIENT_ID") {
        config.qdm.client_id = value;
    }
    if let Some(value) = env_opt("QDM_CLIENT_SECRET") {
        config.qdm.client_secret = value;
    }
    if let Some(value) = env_opt("QDM_DB_PATH") {
        config.persistence.path = value;
    }
    if let Some(value) = env_parse::<u32>("QDM_PAGE_SIZE")? {
        config.qdm.page_size = value;
    }
    if let Some(value) = env_parse::<usize>("QDM_BATCH_SIZE")? {
        config.sync.batch_size = value;
    }
    if let Some(value) = env_parse::<u64>("QDM_TICK_INTERVAL_MS")? {
        config.sync.tick_interval_ms = value;
    }
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    let config: Config = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| QdmSyncError::Config(format!("Invalid TOML format: {e}")))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| QdmSyncError::Config(format!("Invalid JSON format: {e}")))?,
        _ => return Err(QdmSyncError::Config(format!("Unsupported config format: {extension}"))),
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.qdm.base_url.trim().is_empty() {
        return Err(QdmSyncError::Config("qdm.base_url must not be empty".into()));
    }
    if config.qdm.page_size == 0 {
        return Err(QdmSyncError::Config("qdm.page_size must be positive".into()));
    }
    if config.persistence.path.trim().is_empty() {
        return Err(QdmSyncError::Config("persistence.path must not be empty".into()));
    }
    Ok(())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    env_opt(key).ok_or_else(|| {
        QdmSyncError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| QdmSyncError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
