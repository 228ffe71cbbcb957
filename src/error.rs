use std::path::PathBuf;

use thiserror::Error;

/// Problems found before any network call is made. Fatal for the whole run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("an access token with write permission is required")]
    MissingToken,

    #[error("the access token is still set to the placeholder value")]
    PlaceholderToken,

    #[error("invalid repository id `{0}`: expected `name` or `owner/name`")]
    InvalidRepoId(String),

    #[error("the migration plan is empty")]
    EmptyPlan,

    #[error("invalid migration entry for `{0}`: expected `branch: owner/name`")]
    InvalidMigrationEntry(String),

    #[error("a migration entry has an empty branch name")]
    EmptyBranch,

    #[error("branch `{0}` is mapped more than once")]
    DuplicateBranch(String),

    #[error("destination `{0}` is targeted by more than one branch")]
    DuplicateDestination(String),

    #[error("invalid exclude pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("unknown repository type `{0}`")]
    UnknownRepoType(String),

    #[error("could not parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid hub endpoint `{0}`")]
    InvalidEndpoint(String),

    #[error("could not build http client: {0}")]
    HttpClient(String),
}

/// Failures while talking to the hub or staging files locally.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("snapshot download failed: {0}")]
    Download(#[from] hf_hub::api::tokio::ApiError),

    #[error("{method} {url} returned {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("nothing to upload in {0:?}")]
    EmptyTree(PathBuf),

    #[error("no files left to stage from {repository}@{git_ref}")]
    EmptySnapshot { repository: String, git_ref: String },

    #[error("large file {oid} was rejected: {message}")]
    Lfs { oid: String, message: String },
}

impl HubError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HubError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("adapter directory {0:?} does not exist")]
    MissingDirectory(PathBuf),
}
