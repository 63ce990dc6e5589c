//! Request/response calls to the job server that sit beside the monitor:
//! admin login state, the admin download path, and artifact retrieval.

use futures_util::StreamExt;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::monitor::ResultArtifact;

const SESSION_COOKIE: &str = "session";
const COOKIE_FILE: &str = "session";
pub const EMPTY_PATH_MESSAGE: &str = "Path cannot be empty.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LoginStatus {
    #[serde(rename = "loggedIn")]
    pub logged_in: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetPathResponse {
    pub success: bool,
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    #[serde(default)]
    success: bool,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SetPathRequest<'a> {
    path: &'a str,
}

/// Cheap to clone; clones share the session cookie.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    server: Url,
    cookie: Arc<Mutex<Option<String>>>,
    cookie_path: Option<PathBuf>,
}

impl ApiClient {
    pub fn new(client: reqwest::Client, server: Url) -> Self {
        Self {
            client,
            server,
            cookie: Arc::new(Mutex::new(None)),
            cookie_path: None,
        }
    }

    /// Persist the admin session cookie under `dir` so separate runs share it.
    pub fn with_cookie_store(mut self, dir: &Path) -> Self {
        let path = dir.join(COOKIE_FILE);
        let stored = fs::read_to_string(&path)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.cookie = Arc::new(Mutex::new(stored));
        self.cookie_path = Some(path);
        self
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    fn cookie(&self) -> Option<String> {
        self.cookie.lock().ok().and_then(|c| c.clone())
    }

    pub fn has_session(&self) -> bool {
        self.cookie().is_some()
    }

    fn endpoint(&self, name: &str) -> Url {
        let mut url = self.server.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push(name);
        }
        url
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.cookie() {
            Some(value) => req.header(COOKIE, format!("{}={}", SESSION_COOKIE, value)),
            None => req,
        }
    }

    pub async fn check_status(&self) -> Result<LoginStatus> {
        let response = self
            .authed(self.client.get(self.endpoint("check-login")))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Returns whether the server accepted the credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let response = self
            .client
            .post(self.endpoint("login"))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(false);
        }
        let response = ensure_success(response).await?;
        let cookie = session_cookie(response.headers());
        let body: SuccessResponse = response.json().await?;
        if !body.success {
            return Ok(false);
        }

        match cookie {
            Some(value) => self.store_cookie(Some(value))?,
            None => tracing::warn!("login succeeded but no session cookie was set"),
        }
        Ok(true)
    }

    pub async fn logout(&self) -> Result<()> {
        let response = self
            .authed(self.client.post(self.endpoint("logout")))
            .send()
            .await?;
        ensure_success(response).await?;
        self.store_cookie(None)
    }

    pub async fn set_path(&self, path: &str) -> Result<SetPathResponse> {
        if path.trim().is_empty() {
            return Err(ApiError::Validation(EMPTY_PATH_MESSAGE.to_string()));
        }

        let response = self
            .authed(self.client.post(self.endpoint("set-download-path")))
            .json(&SetPathRequest { path })
            .send()
            .await?;

        // Rejections come back as JSON with a non-2xx status.
        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str::<SetPathResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) => Err(ApiError::Status { status, body }),
        }
    }

    /// Download `artifact` into `dir`, returning the written file.
    pub async fn fetch_artifact(&self, artifact: &ResultArtifact, dir: &Path) -> Result<PathBuf> {
        let url = artifact.url(&self.server);
        let target = dir.join(local_file_name(artifact));
        tracing::info!(%url, target = %target.display(), "fetching artifact");

        let response = self.authed(self.client.get(url)).send().await?;
        let response = ensure_success(response).await?;

        tokio::fs::create_dir_all(dir).await?;
        let mut file = tokio::fs::File::create(&target).await?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(target)
    }

    fn store_cookie(&self, value: Option<String>) -> Result<()> {
        if let Ok(mut cookie) = self.cookie.lock() {
            cookie.clone_from(&value);
        }
        let Some(path) = &self.cookie_path else {
            return Ok(());
        };
        match &value {
            Some(value) => {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, value)?;
            }
            None => {
                if path.exists() {
                    fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        body: body.trim().to_string(),
    })
}

fn session_cookie(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(parse_session_cookie)
}

fn parse_session_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
}

/// File name for a fetched artifact, never escaping the target directory.
fn local_file_name(artifact: &ResultArtifact) -> String {
    Path::new(artifact.display_name())
        .file_name()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string()
}
