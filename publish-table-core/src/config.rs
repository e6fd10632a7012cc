use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::aggregate::NoteFilter;

pub const DEFAULT_NOTION_BASE_URL: &str = "https://api.notion.com";

/// Settings for one vault/target pair, as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    pub vault: VaultSettings,
    #[serde(default)]
    pub notion: NotionSettings,
}

impl PublishConfig {
    pub fn trace_loaded(&self) {
        info!(
            vault_root = %self.vault.root.display(),
            types = ?self.vault.types,
            api_key_set = !self.notion.api_key.is_empty(),
            page_id_set = !self.notion.page_id.is_empty(),
            "Loaded PublishConfig"
        );
        debug!(?self, "PublishConfig loaded (full debug)");
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    pub root: PathBuf,
    #[serde(default = "default_exclude_prefixes")]
    pub exclude_prefixes: Vec<String>,
    #[serde(default = "default_types")]
    pub types: Vec<String>,
}

impl VaultSettings {
    pub fn filter(&self) -> NoteFilter {
        NoteFilter {
            exclude_prefixes: self.exclude_prefixes.clone(),
            types: self.types.clone(),
        }
    }
}

fn default_exclude_prefixes() -> Vec<String> {
    NoteFilter::default().exclude_prefixes
}

fn default_types() -> Vec<String> {
    NoteFilter::default().types
}

/// Credentials and endpoint for the remote API. Both credentials default to empty.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionSettings {
    pub api_key: String,
    pub page_id: String,
    pub base_url: String,
}

impl Default for NotionSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            page_id: String::new(),
            base_url: DEFAULT_NOTION_BASE_URL.to_string(),
        }
    }
}

impl NotionSettings {
    /// Whether the API key or page id differs, i.e. whether access must be probed again.
    pub fn credentials_changed(&self, other: &NotionSettings) -> bool {
        self.api_key != other.api_key || self.page_id != other.page_id
    }
}

// Mask api_key so it never reaches logs.
impl std::fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionSettings")
            .field(
                "api_key",
                &if self.api_key.is_empty() { "" } else { "[REDACTED]" },
            )
            .field("page_id", &self.page_id)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: PublishConfig = serde_yaml::from_str("vault:\n  root: ./vault\n").unwrap();
        assert_eq!(config.vault.exclude_prefixes, vec!["Templates/"]);
        assert_eq!(config.vault.types, vec!["tool", "link", "library", "dataset"]);
        assert_eq!(config.notion, NotionSettings::default());
        assert_eq!(config.notion.api_key, "");
        assert_eq!(config.notion.base_url, "https://api.notion.com");
    }

    #[test]
    fn credentials_changed_ignores_base_url() {
        let old = NotionSettings::default();
        let mut new = old.clone();
        new.base_url = "http://localhost:1234".into();
        assert!(!old.credentials_changed(&new));

        new.page_id = "page".into();
        assert!(old.credentials_changed(&new));
    }

    #[test]
    fn debug_redacts_api_key() {
        let settings = NotionSettings {
            api_key: "secret_abc".into(),
            ..NotionSettings::default()
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("secret_abc"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
