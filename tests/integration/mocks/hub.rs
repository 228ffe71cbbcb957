use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const TOKEN: &str = "hf_test_token";

pub fn create_repo_mock(owner: &str, name: &str, private: bool, status: u16) -> Mock {
    Mock::given(method("POST"))
        .and(path("/api/repos/create"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(body_json(json!({
            "name": name,
            "organization": owner,
            "type": "model",
            "private": private,
        })))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "url": format!("https://hub.test/{}/{}", owner, name),
        })))
}

pub fn revision_mock(repo: &str, git_ref: &str, sha: &str, files: &[&str]) -> Mock {
    let siblings: Vec<Value> = files.iter().map(|f| json!({ "rfilename": f })).collect();

    Mock::given(method("GET"))
        .and(path(format!(
            "/api/models/{repo}/revision/{git_ref}",
            repo = repo,
            git_ref = git_ref
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": repo,
            "sha": sha,
            "siblings": siblings,
        })))
}

pub fn revision_error_mock(repo: &str, git_ref: &str, status: u16) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/models/{repo}/revision/{git_ref}",
            repo = repo,
            git_ref = git_ref
        )))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
}

fn resolve_path(repo: &str, sha: &str, file: &str) -> String {
    format!("/{repo}/resolve/{sha}/{file}", repo = repo, sha = sha, file = file)
}

/// File download at a pinned commit, with the headers the hub client reads
/// before fetching the bytes.
pub fn resolve_mock(repo: &str, sha: &str, file: &str, content: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(resolve_path(repo, sha, file)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-repo-commit", sha)
                .insert_header(
                    "etag",
                    format!("\"{}-{}\"", sha, file.replace('/', "-")).as_str(),
                )
                .insert_header("content-range", format!("bytes 0-0/{}", content.len()).as_str())
                .set_body_bytes(content.as_bytes().to_vec()),
        )
}

pub fn resolve_error_mock(repo: &str, sha: &str, file: &str, status: u16) -> Mock {
    Mock::given(method("GET"))
        .and(path(resolve_path(repo, sha, file)))
        .respond_with(ResponseTemplate::new(status).set_body_string("connection dropped"))
}

/// Answers `lfs` for the listed paths and `regular` for everything else.
struct PreuploadResponder {
    lfs: Vec<String>,
}

impl Respond for PreuploadResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let files: Vec<Value> = body["files"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|file| {
                let path = file["path"].as_str().unwrap_or_default().to_string();
                let mode = if self.lfs.contains(&path) { "lfs" } else { "regular" };
                json!({ "path": path, "uploadMode": mode, "shouldIgnore": false })
            })
            .collect();

        ResponseTemplate::new(200).set_body_json(json!({ "files": files }))
    }
}

pub fn preupload_mock(repo: &str, lfs: &[&str]) -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("/api/models/{repo}/preupload/main", repo = repo)))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(PreuploadResponder {
            lfs: lfs.iter().map(|p| p.to_string()).collect(),
        })
}

/// Asks for every requested object to be uploaded to the mock storage.
struct BatchResponder {
    base: String,
}

impl Respond for BatchResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = match serde_json::from_slice(&request.body) {
            Ok(body) => body,
            Err(_) => return ResponseTemplate::new(400),
        };
        let objects: Vec<Value> = body["objects"]
            .as_array()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|object| {
                let oid = object["oid"].as_str().unwrap_or_default().to_string();
                json!({
                    "oid": oid,
                    "size": object["size"],
                    "actions": {
                        "upload": {
                            "href": format!("{}/lfs-storage/{}", self.base, oid),
                            "header": { "x-amz-meta": "hub" },
                        },
                        "verify": {
                            "href": format!("{}/lfs-verify", self.base),
                        },
                    },
                })
            })
            .collect();

        ResponseTemplate::new(200)
            .insert_header("content-type", "application/vnd.git-lfs+json")
            .set_body_json(json!({ "transfer": "basic", "objects": objects }))
    }
}

pub fn lfs_batch_mock(server: &MockServer, repo: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("/{repo}.git/info/lfs/objects/batch", repo = repo)))
        .and(header("accept", "application/vnd.git-lfs+json"))
        .respond_with(BatchResponder { base: server.uri() })
}

pub fn lfs_storage_mock() -> Mock {
    Mock::given(method("PUT"))
        .and(path_regex("^/lfs-storage/[0-9a-f]{64}$"))
        .and(header("x-amz-meta", "hub"))
        .respond_with(ResponseTemplate::new(200))
}

pub fn lfs_verify_mock() -> Mock {
    Mock::given(method("POST"))
        .and(path("/lfs-verify"))
        .respond_with(ResponseTemplate::new(200))
}

pub fn commit_mock(repo: &str, status: u16) -> Mock {
    Mock::given(method("POST"))
        .and(path(format!("/api/models/{repo}/commit/main", repo = repo)))
        .and(header("content-type", "application/x-ndjson"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "commitUrl": format!("https://hub.test/{}/commit/f00d", repo),
            "commitOid": "f00d",
        })))
}

/// Bodies of every object PUT to the mock LFS storage, by oid.
pub async fn stored_objects(server: &MockServer) -> Vec<(String, Vec<u8>)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.method.to_string() == "PUT" && r.url.path().starts_with("/lfs-storage/"))
        .map(|r| {
            let oid = r.url.path().trim_start_matches("/lfs-storage/").to_string();
            (oid, r.body)
        })
        .collect()
}

/// Decoded commit payload: summary plus `(path, content)` per file. Large
/// files show up as `lfs:{oid}`.
pub async fn committed_files(server: &MockServer, repo: &str) -> Option<(String, Vec<(String, String)>)> {
    let commit_path = format!("/api/models/{}/commit/main", repo);
    let requests = server.received_requests().await.unwrap_or_default();
    let request = requests.iter().rev().find(|r| r.url.path() == commit_path)?;

    let body = String::from_utf8(request.body.clone()).ok()?;
    let mut summary = String::new();
    let mut files = Vec::new();
    for line in body.lines() {
        let value: Value = serde_json::from_str(line).ok()?;
        match value["key"].as_str()? {
            "header" => summary = value["value"]["summary"].as_str()?.to_string(),
            "file" => {
                let content = base64::decode(value["value"]["content"].as_str()?).ok()?;
                files.push((
                    value["value"]["path"].as_str()?.to_string(),
                    String::from_utf8(content).ok()?,
                ));
            }
            "lfsFile" => files.push((
                value["value"]["path"].as_str()?.to_string(),
                format!("lfs:{}", value["value"]["oid"].as_str()?),
            )),
            _ => return None,
        }
    }

    Some((summary, files))
}
