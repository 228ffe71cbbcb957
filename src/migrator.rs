use crate::credentials::Credentials;
use crate::error::{ConfigError, HubError};
use crate::event::{Event, Reporter, Step};
use crate::plan::{MigrationPlan, MigrationTask};
use crate::provider::Provider;
use crate::repository::{RepoId, RepoType, Visibility};
use crate::staging::ExcludePatterns;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationResult {
    pub task: MigrationTask,
    pub outcome: Outcome,
}

impl MigrationResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }
}

/// Where tasks read from and how destinations are created.
#[derive(Clone, Debug)]
pub struct MigrationSettings {
    pub source: RepoId,
    pub repo_type: RepoType,
    pub visibility: Visibility,
    pub exclude: ExcludePatterns,
}

impl MigrationSettings {
    pub fn new(source: RepoId) -> Self {
        MigrationSettings {
            source,
            repo_type: RepoType::Model,
            visibility: Visibility::Public,
            exclude: ExcludePatterns::default(),
        }
    }
}

pub struct RepositoryMigrator<P, R> {
    provider: P,
    reporter: R,
    settings: MigrationSettings,
}

impl<P, R> RepositoryMigrator<P, R>
where
    P: Provider + Sync,
    R: Reporter,
{
    pub fn new(provider: P, reporter: R, settings: MigrationSettings) -> Self {
        RepositoryMigrator {
            provider,
            reporter,
            settings,
        }
    }

    /// Runs every task of `plan` in order. A bad token fails the whole run
    /// before any call to the provider; task failures are recorded and the
    /// run moves on.
    pub async fn run(
        &self,
        plan: &MigrationPlan,
        token: Option<&str>,
    ) -> Result<Vec<MigrationResult>, ConfigError> {
        let credentials = Credentials::new(token)?;

        self.reporter.report(Event::RunStarted {
            source: self.settings.source.to_string(),
            tasks: plan.len(),
        });

        let mut results = Vec::with_capacity(plan.len());
        for task in plan.iter() {
            self.reporter.report(Event::TaskStarted {
                branch: task.source_branch.clone(),
                destination: task.destination.to_string(),
            });

            let outcome = match self.migrate(&credentials, task).await {
                Ok(url) => {
                    tracing::info!(branch = %task.source_branch, destination = %task.destination, "migration task succeeded");
                    self.reporter.report(Event::TaskSucceeded {
                        branch: task.source_branch.clone(),
                        url,
                    });
                    Outcome::Success
                }
                Err(error) => {
                    let reason = error.to_string();
                    tracing::warn!(branch = %task.source_branch, destination = %task.destination, error = %reason, "migration task failed");
                    self.reporter.report(Event::TaskFailed {
                        branch: task.source_branch.clone(),
                        reason: reason.clone(),
                    });
                    Outcome::Failure(reason)
                }
            };

            results.push(MigrationResult {
                task: task.clone(),
                outcome,
            });
        }

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        self.reporter.report(Event::RunFinished {
            succeeded,
            failed: results.len() - succeeded,
        });

        Ok(results)
    }

    async fn migrate(
        &self,
        credentials: &Credentials,
        task: &MigrationTask,
    ) -> Result<String, HubError> {
        let settings = &self.settings;

        let step = Step::CreateRepository {
            repository: task.destination.to_string(),
        };
        self.reporter.report(Event::StepStarted(step.clone()));
        self.provider
            .create_repository(
                credentials,
                &task.destination,
                settings.repo_type,
                settings.visibility,
                true,
            )
            .await?;
        self.reporter.report(Event::StepFinished { step, detail: None });

        let step = Step::DownloadSnapshot {
            branch: task.source_branch.clone(),
        };
        self.reporter.report(Event::StepStarted(step.clone()));
        let snapshot = self
            .provider
            .download_snapshot(
                credentials,
                &settings.source,
                settings.repo_type,
                &task.source_branch,
                &settings.exclude,
            )
            .await?;
        self.reporter.report(Event::StepFinished {
            step,
            detail: Some(format!(
                "Downloaded {} files at {} to: {}",
                snapshot.files,
                snapshot.commit,
                snapshot.path.display()
            )),
        });

        let step = Step::Upload {
            repository: task.destination.to_string(),
        };
        self.reporter.report(Event::StepStarted(step.clone()));
        self.provider
            .upload_tree(
                credentials,
                &snapshot.path,
                &task.destination,
                settings.repo_type,
                &commit_message(&settings.source, &task.source_branch),
                &settings.exclude,
            )
            .await?;
        self.reporter.report(Event::StepFinished { step, detail: None });

        Ok(self
            .provider
            .repository_url(&task.destination, settings.repo_type))
    }
}

pub fn commit_message(source: &RepoId, branch: &str) -> String {
    format!("Migrated from {}@{}", source, branch)
}
