use std::path::Path;

use anyhow::{Context, Result};

use super::{load_config, Args, Command};
use crate::event::ConsoleReporter;
use crate::hub_provider::HubProvider;
use crate::migrator::{MigrationResult, RepositoryMigrator};
use crate::publisher::{AdapterPublisher, PublishOutcome};
use crate::repository::Visibility;

pub const EXIT_OK: i32 = 0;
pub const EXIT_TASK_FAILED: i32 = 1;

/// Runs the selected command and returns the process exit code.
pub async fn execute(args: Args) -> Result<i32> {
    match args.command {
        Command::Migrate { config, token } => {
            let results = migrate(&args.endpoint, &config, token).await?;
            Ok(exit_code(&results))
        }
        Command::Publish {
            dir,
            repo_id,
            token,
            private,
        } => {
            let provider = HubProvider::configure_provider(Some(args.endpoint))?;
            let publisher = AdapterPublisher::new(provider)
                .with_visibility(Visibility::from_private(private));

            match publisher
                .publish(&dir, repo_id.as_deref(), token.as_deref())
                .await
                .context("adapter upload failed")?
            {
                PublishOutcome::Skipped => println!("HF_TOKEN or HF_REPO_ID not set, skipping upload"),
                PublishOutcome::Published { url } => println!("Uploaded adapter: {}", url),
            }

            Ok(EXIT_OK)
        }
    }
}

pub async fn migrate(
    endpoint: &str,
    config_path: &Path,
    token: Option<String>,
) -> Result<Vec<MigrationResult>> {
    let config = load_config(config_path)?;
    tracing::debug!(version = %config.version, tasks = config.plan.len(), "loaded config");

    let token = token
        .filter(|t| !t.trim().is_empty())
        .or(config.token);

    let provider =
        HubProvider::configure_provider(Some(endpoint.to_string()))?.with_cache_dir(&config.cache_dir);
    let migrator = RepositoryMigrator::new(provider, ConsoleReporter, config.settings);

    let results = migrator.run(&config.plan, token.as_deref()).await?;

    Ok(results)
}

/// Non-zero as soon as one task failed.
pub fn exit_code(results: &[MigrationResult]) -> i32 {
    if results.iter().all(|r| r.is_success()) {
        EXIT_OK
    } else {
        EXIT_TASK_FAILED
    }
}
