use std::path::PathBuf;

use super::{common::Migrations, reader};
use crate::error::ConfigError;
use crate::migrator::MigrationSettings;
use crate::plan::MigrationPlan;
use crate::repository::{RepoId, RepoType, Visibility};
use crate::staging::ExcludePatterns;

pub const DEFAULT_CACHE_DIR: &str = ".hubmigrate";

#[derive(Clone, Debug)]
pub struct ParsedConfig {
    pub version: String,
    pub token: Option<String>,
    pub settings: MigrationSettings,
    pub plan: MigrationPlan,
    pub cache_dir: PathBuf,
}

pub fn parse_config(config: reader::Config) -> Result<ParsedConfig, ConfigError> {
    let repo_type = match config.repo_type.as_deref() {
        Some(value) => value.parse::<RepoType>()?,
        None => RepoType::default(),
    };

    let exclude = match &config.exclude_patterns {
        Some(patterns) => ExcludePatterns::new(patterns)?,
        None => ExcludePatterns::default(),
    };

    let settings = MigrationSettings {
        source: RepoId::new(&config.source)?,
        repo_type,
        visibility: Visibility::from_private(config.private.unwrap_or(false)),
        exclude,
    };

    Ok(ParsedConfig {
        version: config.version,
        token: config.token,
        settings,
        plan: parse_migrations(config.migrations)?,
        cache_dir: config
            .cache_dir
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
    })
}

fn parse_migrations(migrations: Migrations) -> Result<MigrationPlan, ConfigError> {
    let pairs = match migrations {
        Migrations::List(entries) => entries
            .into_iter()
            .map(|entry| (entry.branch, entry.destination))
            .collect::<Vec<_>>(),
        Migrations::Map(mapping) => mapping
            .into_iter()
            .map(|(branch, destination)| match (branch, destination) {
                (serde_yaml::Value::String(branch), serde_yaml::Value::String(destination)) => {
                    Ok((branch, destination))
                }
                (branch, _) => Err(ConfigError::InvalidMigrationEntry(scalar(&branch))),
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    MigrationPlan::from_pairs(pairs)
}

/// The key as written in the file, without yaml document markers.
fn scalar(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(value) => value.clone(),
        other => serde_yaml::to_string(other)
            .map(|rendered| rendered.trim_start_matches("---").trim().to_string())
            .unwrap_or_default(),
    }
}
