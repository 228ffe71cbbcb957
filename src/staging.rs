use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_recursion::async_recursion;

use crate::error::{ConfigError, HubError};

/// Version-control metadata that is never staged or uploaded.
pub const VCS_METADATA_PATTERNS: [&str; 3] = [".gitattributes", ".git", ".git/**"];

/// Suffixes of files a download left half written. Never uploaded.
pub const PARTIAL_DOWNLOAD_SUFFIXES: [&str; 2] = [".incomplete", ".part"];

/// Relative repository path (always `/`-separated) to the file on disk.
pub type Tree = BTreeMap<String, PathBuf>;

#[derive(Clone, Debug)]
pub struct ExcludePatterns(Vec<glob::Pattern>);

impl ExcludePatterns {
    /// Compiles `patterns`, always adding the version-control metadata ones.
    pub fn new<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut compiled: Vec<glob::Pattern> = Vec::new();

        let extra = patterns.into_iter().map(|p| p.as_ref().to_string());
        let all = VCS_METADATA_PATTERNS.iter().map(|p| p.to_string()).chain(extra);

        for pattern in all {
            if compiled.iter().any(|p| p.as_str() == pattern) {
                continue;
            }
            let glob_pattern =
                glob::Pattern::new(&pattern).map_err(|error| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: error.msg.to_string(),
                })?;
            compiled.push(glob_pattern);
        }

        Ok(ExcludePatterns(compiled))
    }

    pub fn vcs_metadata() -> Self {
        ExcludePatterns(
            VCS_METADATA_PATTERNS
                .iter()
                .filter_map(|p| glob::Pattern::new(p).ok())
                .collect(),
        )
    }

    /// A path is excluded when a pattern matches it whole, or matches one of
    /// its components (so `.git` also hides `sub/.git/config`).
    pub fn is_excluded(&self, path: &str) -> bool {
        self.0.iter().any(|pattern| {
            pattern.matches(path) || path.split('/').any(|component| pattern.matches(component))
        })
    }

    pub fn patterns(&self) -> Vec<&str> {
        self.0.iter().map(|p| p.as_str()).collect()
    }
}

impl Default for ExcludePatterns {
    fn default() -> Self {
        ExcludePatterns::vcs_metadata()
    }
}

/// A branch materialised on local disk. Dropping it releases the task's
/// claim on the directory; the files stay behind as a cache.
#[derive(Clone, Debug, PartialEq)]
pub struct StagingSnapshot {
    pub path: PathBuf,
    pub commit: String,
    pub files: usize,
}

/// Lists every file under `root` that is not excluded.
pub async fn collect_tree(root: &Path, exclude: &ExcludePatterns) -> Result<Tree, HubError> {
    let mut tree = Tree::new();
    walk(root, "", exclude, &mut tree).await?;

    Ok(tree)
}

#[async_recursion]
async fn walk(
    dir: &Path,
    prefix: &str,
    exclude: &ExcludePatterns,
    tree: &mut Tree,
) -> Result<(), HubError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| HubError::io(dir, e))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| HubError::io(dir, e))?
    {
        let name = entry.file_name().to_string_lossy().to_string();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{}/{}", prefix, name)
        };

        if exclude.is_excluded(&relative) {
            continue;
        }

        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| HubError::io(&path, e))?;

        if file_type.is_dir() {
            walk(&path, &relative, exclude, tree).await?;
        } else if is_partial_download(&relative) {
            tracing::debug!(file = %relative, "skipping partial download");
        } else {
            tree.insert(relative, path);
        }
    }

    Ok(())
}

pub fn is_partial_download(path: &str) -> bool {
    PARTIAL_DOWNLOAD_SUFFIXES
        .iter()
        .any(|suffix| path.ends_with(suffix))
}

/// Directory a staged file sits in once its repository path `rfilename` is
/// stripped, e.g. `.../snapshots/{sha}` for `.../snapshots/{sha}/tokenizer/vocab.json`.
pub fn snapshot_root(staged: &Path, rfilename: &str) -> PathBuf {
    let depth = rfilename.split('/').filter(|c| !c.is_empty()).count();

    staged
        .ancestors()
        .nth(depth)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| staged.to_path_buf())
}
