use crate::services::config_service::{self, Config, EffectiveConfig};
use crate::Result;

pub fn get_config() -> Result<EffectiveConfig> {
    config_service::get_effective_config()
}

pub fn get_stored_config() -> Result<Config> {
    config_service::load_config()
}

pub fn set_config_value(key: &str, value: &str) -> Result<Config> {
    config_service::set_value(key, value)
}
