use std::path::{Path, PathBuf};

use async_trait::async_trait;
use hf_hub::api::tokio::{Api, ApiBuilder};
use hf_hub::Repo;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::commit::{self, BatchResponse, PreuploadResponse, UploadFile, PREUPLOAD_BATCH};
use crate::credentials::Credentials;
use crate::error::{ConfigError, HubError};
use crate::provider::Provider;
use crate::repository::{RepoId, RepoType, Visibility};
use crate::staging::{self, ExcludePatterns, StagingSnapshot};

pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";
pub const DEFAULT_BRANCH: &str = "main";

const LFS_CONTENT_TYPE: &str = "application/vnd.git-lfs+json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitInfo {
    commit_oid: Option<String>,
}

/// `Provider` backed by the hub's REST API. Snapshots are fetched through
/// `hf_hub` into its cache layout; commits are sent with `reqwest`.
#[derive(Clone, Debug)]
pub struct HubProvider {
    client: Client,
    endpoint: Url,
    cache_dir: Option<PathBuf>,
}

impl HubProvider {
    /// `base_url` overrides the public hub, e.g. for a mirror or a test server.
    pub fn configure_provider(base_url: Option<String>) -> Result<Self, ConfigError> {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint =
            Url::parse(&base_url).map_err(|_| ConfigError::InvalidEndpoint(base_url.clone()))?;
        if endpoint.cannot_be_a_base() {
            return Err(ConfigError::InvalidEndpoint(base_url));
        }

        let client = Client::builder()
            .user_agent(concat!("hubmigrate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| ConfigError::HttpClient(error.to_string()))?;

        Ok(HubProvider {
            client,
            endpoint,
            cache_dir: None,
        })
    }

    /// Stage snapshots under `cache_dir` instead of the default hub cache.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache_dir.as_deref()
    }

    fn snapshot_api(&self, credentials: &Credentials) -> Result<Api, HubError> {
        let mut builder = ApiBuilder::new()
            .with_endpoint(self.endpoint.as_str().trim_end_matches('/').to_string())
            .with_token(Some(credentials.token().to_string()))
            .with_progress(false);
        if let Some(cache_dir) = &self.cache_dir {
            builder = builder.with_cache_dir(cache_dir.clone());
        }

        Ok(builder.build()?)
    }

    fn url<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.endpoint.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                path.push(segment.as_ref());
            }
        }

        url
    }

    fn repo_url<'a>(
        &self,
        repo_type: RepoType,
        repository: &'a RepoId,
        rest: &[&'a str],
    ) -> Url {
        let segments = ["api", repo_type.api_path()]
            .into_iter()
            .chain(repository.segments())
            .chain(rest.iter().copied());

        self.url(segments)
    }

    /// git-lfs batch endpoint, `{prefix}/{owner}/{name}.git/info/lfs/objects/batch`.
    fn lfs_batch_url(&self, repo_type: RepoType, repository: &RepoId) -> Url {
        let mut segments: Vec<String> = repo_type
            .url_prefix()
            .into_iter()
            .chain(repository.segments())
            .map(str::to_string)
            .collect();
        if let Some(name) = segments.last_mut() {
            name.push_str(".git");
        }
        segments.extend(["info", "lfs", "objects", "batch"].map(str::to_string));

        self.url(segments)
    }

    async fn preupload(
        &self,
        credentials: &Credentials,
        destination: &RepoId,
        repo_type: RepoType,
        files: &[UploadFile],
    ) -> Result<Vec<commit::PreuploadFile>, HubError> {
        let url = self.repo_url(repo_type, destination, &["preupload", DEFAULT_BRANCH]);

        let mut answers = Vec::with_capacity(files.len());
        for batch in files.chunks(PREUPLOAD_BATCH) {
            let response = self
                .client
                .post(url.clone())
                .bearer_auth(credentials.token())
                .json(&commit::preupload_request(batch))
                .send()
                .await?;
            let response = check_status("POST", response).await?;
            let decoded: PreuploadResponse = decode(&url, response).await?;
            answers.extend(decoded.files);
        }

        Ok(answers)
    }

    /// Pushes the content of `files` to large-file storage. Objects the hub
    /// already has come back without an upload action and are skipped.
    async fn upload_lfs_objects(
        &self,
        credentials: &Credentials,
        destination: &RepoId,
        repo_type: RepoType,
        files: &[UploadFile],
    ) -> Result<(), HubError> {
        let url = self.lfs_batch_url(repo_type, destination);
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(credentials.token())
            .header(reqwest::header::ACCEPT, LFS_CONTENT_TYPE)
            .header(reqwest::header::CONTENT_TYPE, LFS_CONTENT_TYPE)
            .body(commit::batch_request(files, DEFAULT_BRANCH).to_string())
            .send()
            .await?;
        let response = check_status("POST", response).await?;
        let batch: BatchResponse = decode(&url, response).await?;

        for object in batch.objects {
            if let Some(error) = object.error {
                return Err(HubError::Lfs {
                    oid: object.oid,
                    message: format!("{} {}", error.code, error.message),
                });
            }
            let file = files
                .iter()
                .find(|f| f.oid == object.oid)
                .ok_or_else(|| HubError::Decode {
                    url: url.to_string(),
                    message: format!("unrequested object {}", object.oid),
                })?;

            let actions = match object.actions {
                Some(actions) => actions,
                None => {
                    tracing::debug!(file = %file.path, oid = %file.oid, "large file already stored");
                    continue;
                }
            };

            if let Some(upload) = actions.upload {
                if upload.header.contains_key("chunk_size") {
                    return Err(HubError::Lfs {
                        oid: object.oid,
                        message: "multipart transfer is not supported".to_string(),
                    });
                }

                let body = tokio::fs::File::open(&file.local)
                    .await
                    .map_err(|e| HubError::io(&file.local, e))?;
                let mut request = self
                    .client
                    .put(&upload.href)
                    .header(reqwest::header::CONTENT_LENGTH, file.size)
                    .body(reqwest::Body::from(body));
                for (name, value) in upload.header.iter() {
                    request = request.header(name.as_str(), value.as_str());
                }
                check_status("PUT", request.send().await?).await?;
                tracing::debug!(file = %file.path, size = file.size, "uploaded large file");
            }

            if let Some(verify) = actions.verify {
                let mut request = self
                    .client
                    .post(&verify.href)
                    .bearer_auth(credentials.token())
                    .json(&json!({ "oid": file.oid, "size": file.size }));
                for (name, value) in verify.header.iter() {
                    request = request.header(name.as_str(), value.as_str());
                }
                check_status("POST", request.send().await?).await?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Provider for HubProvider {
    async fn create_repository(
        &self,
        credentials: &Credentials,
        repository: &RepoId,
        repo_type: RepoType,
        visibility: Visibility,
        exist_ok: bool,
    ) -> Result<(), HubError> {
        let url = self.url(["api", "repos", "create"]);

        let mut body = json!({
            "name": repository.name(),
            "type": repo_type.to_string(),
            "private": visibility.is_private(),
        });
        if let Some(owner) = repository.owner() {
            body["organization"] = json!(owner);
        }

        let response = self
            .client
            .post(url)
            .bearer_auth(credentials.token())
            .json(&body)
            .send()
            .await?;

        if exist_ok && response.status() == reqwest::StatusCode::CONFLICT {
            tracing::debug!(repository = %repository, "repository already exists");
            return Ok(());
        }
        check_status("POST", response).await?;

        Ok(())
    }

    async fn download_snapshot(
        &self,
        credentials: &Credentials,
        repository: &RepoId,
        repo_type: RepoType,
        git_ref: &str,
        exclude: &ExcludePatterns,
    ) -> Result<StagingSnapshot, HubError> {
        let api = self.snapshot_api(credentials)?;
        let hub_type = hub_repo_type(repo_type);

        let info = api
            .repo(Repo::with_revision(
                repository.to_string(),
                hub_type,
                git_ref.to_string(),
            ))
            .info()
            .await?;
        // pin every file to the resolved commit so a moving branch cannot mix revisions
        let pinned = api.repo(Repo::with_revision(
            repository.to_string(),
            hub_type,
            info.sha.clone(),
        ));

        let mut root = None;
        let mut files = 0;
        for sibling in info.siblings.iter() {
            let name = sibling.rfilename.as_str();
            if name.starts_with('/') || name.split('/').any(|component| component == "..") {
                return Err(HubError::Decode {
                    url: self.repo_url(repo_type, repository, &["revision", git_ref]).to_string(),
                    message: format!("refusing to stage `{}`", name),
                });
            }
            if exclude.is_excluded(name) {
                tracing::debug!(file = %name, "skipping excluded file");
                continue;
            }

            let staged = pinned.get(name).await?;
            tracing::debug!(file = %name, path = %staged.display(), "staged file");
            if root.is_none() {
                root = Some(staging::snapshot_root(&staged, name));
            }
            files += 1;
        }

        let path = root.ok_or_else(|| HubError::EmptySnapshot {
            repository: repository.to_string(),
            git_ref: git_ref.to_string(),
        })?;

        Ok(StagingSnapshot {
            path,
            commit: info.sha,
            files,
        })
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
        let tree = staging::collect_tree(local_path, exclude).await?;
        if tree.is_empty() {
            return Err(HubError::EmptyTree(local_path.to_path_buf()));
        }

        let mut files = Vec::with_capacity(tree.len());
        for (path, local) in tree {
            files.push(UploadFile::inspect(path, local).await?);
        }

        let answers = self
            .preupload(credentials, destination, repo_type, &files)
            .await?;
        let routing = commit::route(files, &answers);
        for path in routing.ignored.iter() {
            tracing::debug!(file = %path, "hub ignores file, not committing it");
        }
        if routing.regular.is_empty() && routing.lfs.is_empty() {
            return Err(HubError::EmptyTree(local_path.to_path_buf()));
        }

        if !routing.lfs.is_empty() {
            self.upload_lfs_objects(credentials, destination, repo_type, &routing.lfs)
                .await?;
        }

        let body = commit::commit_payload(commit_message, &routing.regular, &routing.lfs).await?;
        let url = self.repo_url(repo_type, destination, &["commit", DEFAULT_BRANCH]);
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(credentials.token())
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let response = check_status("POST", response).await?;

        let files = routing.regular.len() + routing.lfs.len();
        match response.json::<CommitInfo>().await {
            Ok(CommitInfo {
                commit_oid: Some(oid),
            }) => tracing::info!(destination = %destination, commit = %oid, files, large_files = routing.lfs.len(), "uploaded tree"),
            _ => tracing::info!(destination = %destination, files, large_files = routing.lfs.len(), "uploaded tree"),
        }

        Ok(())
    }

    fn repository_url(&self, repository: &RepoId, repo_type: RepoType) -> String {
        let segments = repo_type.url_prefix().into_iter().chain(repository.segments());

        self.url(segments).to_string()
    }
}

fn hub_repo_type(repo_type: RepoType) -> hf_hub::RepoType {
    match repo_type {
        RepoType::Model => hf_hub::RepoType::Model,
        RepoType::Dataset => hf_hub::RepoType::Dataset,
        RepoType::Space => hf_hub::RepoType::Space,
    }
}

async fn check_status(method: &'static str, response: Response) -> Result<Response, HubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();

    Err(HubError::Status {
        method,
        url,
        status: status.as_u16(),
        body,
    })
}

async fn decode<T: DeserializeOwned>(url: &Url, response: Response) -> Result<T, HubError> {
    response.json::<T>().await.map_err(|error| HubError::Decode {
        url: url.to_string(),
        message: error.to_string(),
    })
}
