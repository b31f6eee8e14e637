use std::fs;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Result;

const API_KEY_PATTERN: &str = r#"API_KEY\s*=\s*["']([^"']+)["']"#;

/// The key found in a Python settings file, under every name the frontend
/// and the server scripts look it up by.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ApiKeys {
    pub api_key: String,
    pub gemini_api_key: String,
    pub maps_api_key: String,
}

impl ApiKeys {
    fn from_key(key: String) -> Self {
        Self {
            gemini_api_key: key.clone(),
            maps_api_key: key.clone(),
            api_key: key,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.api_key.is_empty()
    }
}

/// Pull `API_KEY = "..."` out of source text. No match yields empty keys.
pub fn extract_api_key(source: &str) -> Result<ApiKeys> {
    let re = Regex::new(API_KEY_PATTERN)?;
    let key = re
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    Ok(ApiKeys::from_key(key))
}

pub fn extract_api_key_from_file(path: &Path) -> Result<ApiKeys> {
    let content = fs::read_to_string(path)?;
    let keys = extract_api_key(&content)?;
    if keys.is_empty() {
        tracing::warn!(path = %path.display(), "no API_KEY assignment found");
    }
    Ok(keys)
}
