use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::{AppError, AppResult};

/// File the operator can drop next to the binary to override defaults.
const CONFIG_FILE: &str = "uploader.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding pending videos.
    pub upload_dir: PathBuf,
    /// Directory successfully uploaded videos are moved to.
    pub uploaded_dir: PathBuf,
    /// Directory videos are quarantined in after repeated upload failures.
    pub failed_dir: PathBuf,
    pub client_secrets_file: PathBuf,
    pub token_cache_file: PathBuf,
    pub log_file: PathBuf,
    /// Inclusive bounds (whole minutes) for the random wait between uploads.
    pub min_wait_minutes: u64,
    pub max_wait_minutes: u64,
    /// Upload attempts per file before it is moved to the failed directory.
    pub max_attempts: u32,
    pub category_id: String,
    pub privacy_status: String,
    pub made_for_kids: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("upload"),
            uploaded_dir: PathBuf::from("uploaded"),
            failed_dir: PathBuf::from("failed"),
            client_secrets_file: PathBuf::from("client_secrets.json"),
            token_cache_file: PathBuf::from("tokencache.json"),
            log_file: PathBuf::from("upload_log.txt"),
            min_wait_minutes: 30,
            max_wait_minutes: 40,
            max_attempts: 3,
            category_id: "22".to_string(), // People & Blogs
            privacy_status: "public".to_string(),
            made_for_kids: false,
        }
    }
}

/// Load `uploader.json` from the working directory, falling back to
/// defaults when it is absent. A present-but-broken file is an error
/// rather than a silent fallback.
pub fn load_config() -> AppResult<Config> {
    load_config_from(Path::new(CONFIG_FILE))
}

pub fn load_config_from(path: &Path) -> AppResult<Config> {
    let config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        serde_json::from_str(&config_str)
            .map_err(|e| AppError::Config(format!("failed to parse {}: {}", path.display(), e)))?
    } else {
        log::info!("No {} found, using defaults", path.display());
        Config::default()
    };

    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> AppResult<()> {
    if config.min_wait_minutes > config.max_wait_minutes {
        return Err(AppError::Config(format!(
            "min_wait_minutes ({}) must not exceed max_wait_minutes ({})",
            config.min_wait_minutes, config.max_wait_minutes
        )));
    }

    if config.max_attempts == 0 {
        return Err(AppError::Config(
            "max_attempts must be at least 1".to_string(),
        ));
    }

    if config.category_id.is_empty() || !config.category_id.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Config(format!(
            "category_id must be a numeric YouTube category, got '{}'",
            config.category_id
        )));
    }

    let valid_privacy = ["public", "unlisted", "private"];
    if !valid_privacy.contains(&config.privacy_status.as_str()) {
        return Err(AppError::Config(format!(
            "privacy_status must be 'public', 'unlisted' or 'private', got '{}'",
            config.privacy_status
        )));
    }

    Ok(())
}
