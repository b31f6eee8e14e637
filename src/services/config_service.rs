use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::file_service::get_app_config_dir;
use crate::{Error, Result};

pub const DEFAULT_AI_ENDPOINT: &str = "http://localhost:8000/api/ai-chat";
pub const DEFAULT_LOGIN_ENDPOINT: &str = "http://localhost:8000/api/login";
pub const DEFAULT_LLM_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_LLM_MODEL: &str = "gemini-2.5-flash";

const ENV_AI_ENDPOINT: &str = "CARELINK_AI_ENDPOINT";
const ENV_LOGIN_ENDPOINT: &str = "CARELINK_LOGIN_ENDPOINT";
const ENV_LLM_API_KEY: &str = "CARELINK_LLM_API_KEY";

/// What is stored on disk. Every field is optional so a partial file still loads.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ai_endpoint: Option<String>,
    #[serde(default)]
    pub login_endpoint: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub llm_base_url: Option<String>,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default)]
    pub log_json: bool,
}

/// Config after defaults and environment overrides are applied.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub ai_endpoint: String,
    pub login_endpoint: String,
    pub request_timeout: Option<Duration>,
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub log_json: bool,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Config::default().resolve(|_| None)
    }
}

impl Config {
    /// Fill in defaults, letting `env` override the endpoints and the key.
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> EffectiveConfig {
        let pick = |var: &str, stored: &Option<String>, default: &str| {
            env(var)
                .filter(|v| !v.is_empty())
                .or_else(|| stored.clone())
                .unwrap_or_else(|| default.to_string())
        };

        EffectiveConfig {
            ai_endpoint: pick(ENV_AI_ENDPOINT, &self.ai_endpoint, DEFAULT_AI_ENDPOINT),
            login_endpoint: pick(ENV_LOGIN_ENDPOINT, &self.login_endpoint, DEFAULT_LOGIN_ENDPOINT),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            llm_base_url: self
                .llm_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            llm_api_key: pick(ENV_LLM_API_KEY, &self.llm_api_key, ""),
            llm_model: self
                .llm_model
                .clone()
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            log_json: self.log_json,
        }
    }

    /// Set one field by its file name. Endpoints must parse as absolute URLs.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "ai_endpoint" => self.ai_endpoint = Some(validate_url(value)?),
            "login_endpoint" => self.login_endpoint = Some(validate_url(value)?),
            "llm_base_url" => self.llm_base_url = Some(validate_url(value)?),
            "llm_api_key" => self.llm_api_key = Some(value.to_string()),
            "llm_model" => self.llm_model = Some(value.to_string()),
            "request_timeout_secs" => {
                let secs = value
                    .parse::<u64>()
                    .map_err(|e| Error::Config(format!("Invalid timeout '{}': {}", value, e)))?;
                self.request_timeout_secs = Some(secs);
            }
            "log_json" => {
                self.log_json = value
                    .parse::<bool>()
                    .map_err(|e| Error::Config(format!("Invalid flag '{}': {}", value, e)))?;
            }
            other => return Err(Error::Config(format!("Unknown config key '{}'", other))),
        }
        Ok(())
    }
}

fn validate_url(value: &str) -> Result<String> {
    url::Url::parse(value)
        .map(|_| value.to_string())
        .map_err(|e| Error::Config(format!("Invalid URL '{}': {}", value, e)))
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_app_config_dir()?.join("config.json"))
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path()?)
}

pub fn save_config(config: &Config) -> Result<()> {
    save_config_to(&get_config_path()?, config)
}

pub fn set_value(key: &str, value: &str) -> Result<Config> {
    let mut config = load_config().unwrap_or_default();
    config.set(key, value)?;
    save_config(&config)?;
    tracing::info!(key, "config updated");
    Ok(config)
}

pub fn get_effective_config() -> Result<EffectiveConfig> {
    Ok(load_config()?.resolve(|var| std::env::var(var).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());

        let effective = config.resolve(|_| None);
        assert_eq!(effective.ai_endpoint, DEFAULT_AI_ENDPOINT);
        assert_eq!(effective.llm_model, DEFAULT_LLM_MODEL);
        assert_eq!(effective.request_timeout, None);
    }

    #[test]
    fn saved_values_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.set("ai_endpoint", "https://care.example.com/api/ai-chat").unwrap();
        config.set("request_timeout_secs", "30").unwrap();
        save_config_to(&path, &config).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.ai_endpoint.as_deref(), Some("https://care.example.com/api/ai-chat"));
        assert_eq!(loaded.resolve(|_| None).request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn environment_beats_file() {
        let config = Config {
            ai_endpoint: Some("https://file.example.com/chat".into()),
            ..Default::default()
        };
        let effective = config.resolve(|var| {
            (var == ENV_AI_ENDPOINT).then(|| "https://env.example.com/chat".to_string())
        });
        assert_eq!(effective.ai_endpoint, "https://env.example.com/chat");
        assert_eq!(effective.login_endpoint, DEFAULT_LOGIN_ENDPOINT);
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = Config::default();
        assert!(matches!(config.set("ai_endpoint", "not a url"), Err(Error::Config(_))));
        assert!(matches!(config.set("request_timeout_secs", "soon"), Err(Error::Config(_))));
        assert!(matches!(config.set("theme", "dark"), Err(Error::Config(_))));
    }
}
