/// `load_config` module: loads the YAML settings file, injects secrets from the environment,
/// and writes settings back after `configure`.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into [`PublishConfig`]
/// - Override `notion.api_key` / `notion.page_id` from `NOTION_API_KEY` / `NOTION_PAGE_ID`
///   when those are set and non-empty (a `.env` file is honoured by `main`)
/// - Persist settings with [`save_config`]
///
/// # Errors
/// All errors use `anyhow::Error` with the offending path in the message, and are surfaced
/// at the CLI boundary.
use anyhow::{Context, Result};
use publish_table_core::config::PublishConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const API_KEY_ENV: &str = "NOTION_API_KEY";
pub const PAGE_ID_ENV: &str = "NOTION_PAGE_ID";

fn env_override(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Loads the settings file and applies environment overrides for the credentials.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PublishConfig> {
    let mut config = load_config_file(path)?;

    if let Some(key) = env_override(API_KEY_ENV) {
        info!("{API_KEY_ENV} found in env, overriding notion.api_key");
        config.notion.api_key = key;
    }
    if let Some(page_id) = env_override(PAGE_ID_ENV) {
        info!(page_id = %page_id, "{PAGE_ID_ENV} found in env, overriding notion.page_id");
        config.notion.page_id = page_id;
    }

    config.trace_loaded();
    Ok(config)
}

/// Loads the settings file exactly as written, without environment overrides.
///
/// Used by `configure`, which must not persist secrets that only live in the environment.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<PublishConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    match serde_yaml::from_str::<PublishConfig>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Writes settings back to `path` as YAML.
pub fn save_config<P: AsRef<Path>>(path: P, config: &PublishConfig) -> Result<()> {
    let path_ref = path.as_ref();
    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    fs::write(path_ref, yaml)
        .with_context(|| format!("Failed to write config file {:?}", path_ref))?;
    info!(config_path = ?path_ref, "Config saved");
    Ok(())
}
