use publish_table::load_config::{load_config, load_config_file, save_config, API_KEY_ENV, PAGE_ID_ENV};
use publish_table_core::config::DEFAULT_NOTION_BASE_URL;
use serial_test::serial;
use std::env;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn clear_env() {
    env::remove_var(API_KEY_ENV);
    env::remove_var(PAGE_ID_ENV);
}

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).expect("write config");
    file
}

/// A file with only the vault root falls back to the default filter and endpoint.
#[test]
#[serial]
fn minimal_config_gets_defaults() {
    clear_env();
    let file = config_file("vault:\n  root: ./notes\n");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.vault.root, PathBuf::from("./notes"));
    assert_eq!(config.vault.exclude_prefixes, vec!["Templates/".to_string()]);
    assert_eq!(
        config.vault.types,
        vec!["tool", "link", "library", "dataset"]
    );
    assert_eq!(config.notion.api_key, "");
    assert_eq!(config.notion.page_id, "");
    assert_eq!(config.notion.base_url, DEFAULT_NOTION_BASE_URL);
}

#[test]
#[serial]
fn full_config_is_read_verbatim() {
    clear_env();
    let file = config_file(
        r#"
vault:
  root: /data/vault
  exclude_prefixes: ["Archive/", "Templates/"]
  types: [tool]
notion:
  api_key: secret_from_file
  page_id: page-from-file
  base_url: http://localhost:9999
"#,
    );

    let config = load_config(file.path()).expect("Config should load");
    assert_eq!(config.vault.exclude_prefixes.len(), 2);
    assert_eq!(config.vault.types, vec!["tool"]);
    assert_eq!(config.notion.api_key, "secret_from_file");
    assert_eq!(config.notion.page_id, "page-from-file");
    assert_eq!(config.notion.base_url, "http://localhost:9999");
}

#[test]
#[serial]
fn environment_overrides_credentials() {
    clear_env();
    let file = config_file(
        "vault:\n  root: ./notes\nnotion:\n  api_key: from_file\n  page_id: file-page\n",
    );
    env::set_var(API_KEY_ENV, "from_env");
    env::set_var(PAGE_ID_ENV, "env-page");

    let config = load_config(file.path()).expect("Config should load");
    clear_env();

    assert_eq!(config.notion.api_key, "from_env");
    assert_eq!(config.notion.page_id, "env-page");
}

#[test]
#[serial]
fn blank_environment_values_are_ignored() {
    clear_env();
    let file = config_file("vault:\n  root: ./notes\nnotion:\n  api_key: from_file\n");
    env::set_var(API_KEY_ENV, "   ");

    let config = load_config(file.path()).expect("Config should load");
    clear_env();

    assert_eq!(config.notion.api_key, "from_file");
}

#[test]
#[serial]
fn load_config_file_skips_environment() {
    clear_env();
    let file = config_file("vault:\n  root: ./notes\n");
    env::set_var(API_KEY_ENV, "from_env");

    let config = load_config_file(file.path()).expect("Config should load");
    clear_env();

    assert_eq!(config.notion.api_key, "");
}

#[test]
#[serial]
fn invalid_yaml_is_a_parse_error() {
    clear_env();
    let file = config_file("not-yaml: [:::");

    let msg = load_config(file.path()).unwrap_err().to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

#[test]
#[serial]
fn missing_vault_section_is_rejected() {
    clear_env();
    let file = config_file("notion:\n  page_id: abc\n");
    assert!(load_config(file.path()).is_err());
}

#[test]
#[serial]
fn missing_file_names_the_path() {
    clear_env();
    let msg = load_config("/definitely/not/here.yaml")
        .unwrap_err()
        .to_string();
    assert!(msg.contains("Failed to read config file"), "got: {msg}");
    assert!(msg.contains("here.yaml"), "got: {msg}");
}

#[test]
#[serial]
fn saved_config_loads_back_unchanged() {
    clear_env();
    let file = config_file("vault:\n  root: ./notes\n");
    let mut config = load_config_file(file.path()).expect("Config should load");
    config.notion.api_key = "secret_new".to_string();
    config.notion.page_id = "page-new".to_string();

    save_config(file.path(), &config).expect("save ok");
    let reloaded = load_config_file(file.path()).expect("reload ok");

    assert_eq!(reloaded, config);
}
