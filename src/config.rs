use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const API_KEY_ENV: &str = "COMPLETION_API_KEY";
pub const ENDPOINT_ENV: &str = "COMPLETION_ENDPOINT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model_uri: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Applied to both connecting and reading.
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://llm.api.cloud.yandex.net/foundationModels/v1/completion"
                .to_string(),
            api_key: String::new(),
            model_uri: "gpt://<folder-id>/yandexgpt-lite".to_string(),
            temperature: 0.6,
            max_tokens: 2000,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
    pub poll_interval_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "data/room.db".to_string(),
            poll_interval_ms: 1000,
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    let mut config = match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    };

    apply_env_overrides(&mut config, |key| env::var(key).ok());
    if config.completion.api_key.is_empty() {
        log::warn!("No completion API key configured; set {API_KEY_ENV} or completion.api_key");
    }
    config
}

/// Secrets and endpoints may come from the environment (or `.env`) instead of the file.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(api_key) = lookup(API_KEY_ENV).filter(|value| !value.is_empty()) {
        config.completion.api_key = api_key;
    }
    if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|value| !value.is_empty()) {
        config.completion.endpoint = endpoint;
    }
}

pub fn save_config(path: &str, config: &AppConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.completion.timeout_secs, 30);
        assert_eq!(config.completion.max_tokens, 2000);
        assert_eq!(config.storage.database_path, "data/room.db");
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.json");
        fs::write(
            &path,
            r#"{"completion": {"model_uri": "gpt://abc/yandexgpt-lite"}, "storage": {"poll_interval_ms": 250}}"#,
        )
        .unwrap();

        let config = load_config(path.to_str().unwrap());
        assert_eq!(config.completion.model_uri, "gpt://abc/yandexgpt-lite");
        assert_eq!(config.completion.temperature, 0.6);
        assert_eq!(config.storage.poll_interval_ms, 250);
        assert_eq!(config.storage.database_path, "data/room.db");
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig::default();
        config.completion.api_key = "from-file".to_string();
        apply_env_overrides(&mut config, |key| match key {
            API_KEY_ENV => Some("from-env".to_string()),
            ENDPOINT_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.completion.api_key, "from-env");
        assert_eq!(config.completion.endpoint, CompletionConfig::default().endpoint);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("chat.json");
        let path = path.to_str().unwrap();

        let mut config = AppConfig::default();
        config.storage.database_path = "elsewhere.db".to_string();
        save_config(path, &config).unwrap();

        assert_eq!(load_config(path).storage.database_path, "elsewhere.db");
    }
}
