use std::path::Path;

use crate::credentials::Credentials;
use crate::error::PublishError;
use crate::provider::Provider;
use crate::repository::{RepoId, RepoType, Visibility};
use crate::staging::ExcludePatterns;

/// Default location the fine-tuning run writes its adapter to.
pub const DEFAULT_ADAPTER_DIR: &str = "result/adaptor";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Token or repository id was not provided.
    Skipped,
    Published { url: String },
}

/// Uploads a trained adapter directory (weights and tokenizer files) to a
/// hub repository.
pub struct AdapterPublisher<P> {
    provider: P,
    repo_type: RepoType,
    visibility: Visibility,
    exclude: ExcludePatterns,
}

impl<P> AdapterPublisher<P>
where
    P: Provider + Sync,
{
    pub fn new(provider: P) -> Self {
        AdapterPublisher {
            provider,
            repo_type: RepoType::Model,
            visibility: Visibility::Public,
            exclude: ExcludePatterns::default(),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub async fn publish(
        &self,
        dir: &Path,
        repo_id: Option<&str>,
        token: Option<&str>,
    ) -> Result<PublishOutcome, PublishError> {
        let (repo_id, token) = match (non_empty(repo_id), non_empty(token)) {
            (Some(repo_id), Some(token)) => (repo_id, token),
            _ => {
                tracing::info!("token or repository id not set, skipping upload");
                return Ok(PublishOutcome::Skipped);
            }
        };

        let credentials = Credentials::new(Some(token))?;
        let repository = RepoId::new(repo_id)?;
        if !tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
        {
            return Err(PublishError::MissingDirectory(dir.to_path_buf()));
        }

        tracing::info!(repository = %repository, dir = %dir.display(), "uploading adapter");
        self.provider
            .create_repository(
                &credentials,
                &repository,
                self.repo_type,
                self.visibility,
                true,
            )
            .await?;
        self.provider
            .upload_tree(
                &credentials,
                dir,
                &repository,
                self.repo_type,
                &format!("Upload adapter from {}", dir.display()),
                &self.exclude,
            )
            .await?;

        Ok(PublishOutcome::Published {
            url: self.provider.repository_url(&repository, self.repo_type),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
