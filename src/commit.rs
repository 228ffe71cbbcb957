//! Building a hub commit: which files go inline and which go through git-lfs.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::HubError;

/// Bytes of each file the hub looks at to decide the upload mode.
pub const SAMPLE_SIZE: usize = 512;

/// Most files the preupload endpoint accepts per request.
pub const PREUPLOAD_BATCH: usize = 256;

const READ_BUFFER: usize = 64 * 1024;

/// A file about to be committed, hashed but not held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub path: String,
    pub local: PathBuf,
    pub size: u64,
    pub oid: String,
    pub sample: Vec<u8>,
}

impl UploadFile {
    /// Reads `local` once to get its size, sha256 and leading sample.
    pub async fn inspect(path: String, local: PathBuf) -> Result<Self, HubError> {
        let mut file = tokio::fs::File::open(&local)
            .await
            .map_err(|e| HubError::io(&local, e))?;

        let mut hasher = Sha256::new();
        let mut sample = Vec::with_capacity(SAMPLE_SIZE);
        let mut buffer = vec![0u8; READ_BUFFER];
        let mut size = 0u64;
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| HubError::io(&local, e))?;
            if read == 0 {
                break;
            }
            if sample.len() < SAMPLE_SIZE {
                let take = (SAMPLE_SIZE - sample.len()).min(read);
                sample.extend_from_slice(&buffer[..take]);
            }
            hasher.update(&buffer[..read]);
            size += read as u64;
        }

        Ok(UploadFile {
            path,
            local,
            size,
            oid: hex::encode(hasher.finalize()),
            sample,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    Regular,
    Lfs,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreuploadFile {
    pub path: String,
    pub upload_mode: UploadMode,
    #[serde(default)]
    pub should_ignore: bool,
}

#[derive(Debug, Deserialize)]
pub struct PreuploadResponse {
    #[serde(default)]
    pub files: Vec<PreuploadFile>,
}

pub fn preupload_request(files: &[UploadFile]) -> Value {
    let files: Vec<Value> = files
        .iter()
        .map(|file| {
            json!({
                "path": file.path,
                "sample": base64::encode(&file.sample),
                "size": file.size,
            })
        })
        .collect();

    json!({ "files": files })
}

/// Files sorted by how they travel in the commit.
#[derive(Debug, Default)]
pub struct Routing {
    pub regular: Vec<UploadFile>,
    pub lfs: Vec<UploadFile>,
    pub ignored: Vec<String>,
}

/// Files the hub did not mention go inline.
pub fn route(files: Vec<UploadFile>, answers: &[PreuploadFile]) -> Routing {
    let answers: HashMap<&str, &PreuploadFile> =
        answers.iter().map(|a| (a.path.as_str(), a)).collect();

    let mut routing = Routing::default();
    for file in files {
        match answers.get(file.path.as_str()) {
            Some(answer) if answer.should_ignore => routing.ignored.push(file.path),
            Some(answer) if answer.upload_mode == UploadMode::Lfs => routing.lfs.push(file),
            _ => routing.regular.push(file),
        }
    }

    routing
}

pub fn batch_request(files: &[UploadFile], branch: &str) -> Value {
    let objects: Vec<Value> = files
        .iter()
        .map(|file| json!({ "oid": file.oid, "size": file.size }))
        .collect();

    json!({
        "operation": "upload",
        "transfers": ["basic"],
        "hash_algo": "sha256",
        "ref": { "name": branch },
        "objects": objects,
    })
}

#[derive(Debug, Deserialize)]
pub struct BatchResponse {
    #[serde(default)]
    pub objects: Vec<BatchObject>,
}

#[derive(Debug, Deserialize)]
pub struct BatchObject {
    pub oid: String,
    #[serde(default)]
    pub actions: Option<BatchActions>,
    #[serde(default)]
    pub error: Option<BatchObjectError>,
}

#[derive(Debug, Deserialize)]
pub struct BatchActions {
    pub upload: Option<BatchAction>,
    pub verify: Option<BatchAction>,
}

#[derive(Debug, Deserialize)]
pub struct BatchAction {
    pub href: String,
    #[serde(default)]
    pub header: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct BatchObjectError {
    pub code: u16,
    pub message: String,
}

/// Newline-delimited commit body. Only `regular` files are read into memory.
pub async fn commit_payload(
    summary: &str,
    regular: &[UploadFile],
    lfs: &[UploadFile],
) -> Result<String, HubError> {
    let mut lines = Vec::with_capacity(regular.len() + lfs.len() + 1);
    lines.push(json!({
        "key": "header",
        "value": { "summary": summary, "description": "" },
    }));

    for file in regular {
        let content = tokio::fs::read(&file.local)
            .await
            .map_err(|e| HubError::io(&file.local, e))?;
        lines.push(json!({
            "key": "file",
            "value": {
                "path": file.path,
                "content": base64::encode(&content),
                "encoding": "base64",
            },
        }));
    }
    for file in lfs {
        lines.push(json!({
            "key": "lfsFile",
            "value": {
                "path": file.path,
                "algo": "sha256",
                "oid": file.oid,
                "size": file.size,
            },
        }));
    }

    Ok(lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}
