use std::path::PathBuf;

use serde::Deserialize;

use super::common::Migrations;
use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Config {
    pub version: String,
    pub token: Option<String>,
    pub source: String,
    pub repo_type: Option<String>,
    pub private: Option<bool>,
    pub cache_dir: Option<PathBuf>,
    pub exclude_patterns: Option<Vec<String>>,
    pub migrations: Migrations,
}

pub fn read_config(config: &str) -> Result<Config, ConfigError> {
    let deserialized_config: Config = serde_yaml::from_str(config)?;

    Ok(deserialized_config)
}
