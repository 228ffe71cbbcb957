use std::path::Path;

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::HubError;
use crate::repository::{RepoId, RepoType, Visibility};
use crate::staging::{ExcludePatterns, StagingSnapshot};

/// The three hub operations a migration needs.
#[async_trait]
pub trait Provider {
    /// Creates `repository`. With `exist_ok` an existing repository counts as
    /// created.
    async fn create_repository(
        &self,
        credentials: &Credentials,
        repository: &RepoId,
        repo_type: RepoType,
        visibility: Visibility,
        exist_ok: bool,
    ) -> Result<(), HubError>;

    /// Materialises every non-excluded file of `git_ref` on local disk.
    async fn download_snapshot(
        &self,
        credentials: &Credentials,
        repository: &RepoId,
        repo_type: RepoType,
        git_ref: &str,
        exclude: &ExcludePatterns,
    ) -> Result<StagingSnapshot, HubError>;

    /// Commits the whole tree under `local_path` to the default branch of
    /// `destination`.
    async fn upload_tree(
        &self,
        credentials: &Credentials,
        local_path: &Path,
        destination: &RepoId,
        repo_type: RepoType,
        commit_message: &str,
        exclude: &ExcludePatterns,
    ) -> Result<(), HubError>;

    fn repository_url(&self, repository: &RepoId, repo_type: RepoType) -> String;
}

#[async_trait]
impl<T> Provider for &T
where
    T: Provider + Sync + ?Sized,
{
    async fn create_repository(
        &self,
        credentials: &Credentials,
        repository: &RepoId,
        repo_type: RepoType,
        visibility: Visibility,
        exist_ok: bool,
    ) -> Result<(), HubError> {
        (**self)
            .create_repository(credentials, repository, repo_type, visibility, exist_ok)
            .await
    }

    async fn download_snapshot(
        &self,
        credentials: &Credentials,
        repository: &RepoId,
        repo_type: RepoType,
        git_ref: &str,
        exclude: &ExcludePatterns,
    ) -> Result<StagingSnapshot, HubError> {
        (**self)
            .download_snapshot(credentials, repository, repo_type, git_ref, exclude)
            .await
    }

    async fn upload_tree(
        &self,
        credentials: &Credentials,
        local_path: &Path,
        destination: &RepoId,
        repo_type: RepoType,
        commit_message: &str,
        exclude: &ExcludePatterns,
    ) -> Result<(), HubError> {
        (**self)
            .upload_tree(
                credentials,
                local_path,
                destination,
                repo_type,
                commit_message,
                exclude,
            )
            .await
    }

    fn repository_url(&self, repository: &RepoId, repo_type: RepoType) -> String {
        (**self).repository_url(repository, repo_type)
    }
}
