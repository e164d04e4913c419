//! Bitbucket Cloud client
//!
//! Implements [`RemoteVcs`] against the Bitbucket Cloud 2.0 REST API. Every
//! call authenticates with the caller-supplied username/app-password pair via
//! HTTP basic auth. Endpoints used:
//!
//! - `GET  /2.0/repositories/{workspace}/{slug}/commits?include={branch}`
//! - `GET  /2.0/repositories/{workspace}/{slug}/src/{commit}/{path}`
//! - `POST /2.0/repositories/{workspace}/{slug}/refs/branches`
//! - `POST /2.0/repositories/{workspace}/{slug}/src` (form-encoded file fields)
//! - `POST /2.0/repositories/{workspace}/{slug}/pullrequests`
//!
//! # Thread Safety
//!
//! The client holds a pooled `reqwest::Client` and is safe to share across
//! tasks, which keeps the door open for processing repositories in parallel.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Credentials;

use super::api::{FileChange, NewPullRequest, PullRequest, RemoteError, RemoteVcs};

const DEFAULT_API_BASE: &str = "https://api.bitbucket.org/2.0";

/// Default request timeout for Bitbucket API calls
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Bitbucket Cloud API client for one workspace.
pub struct BitbucketClient {
    workspace: String,
    credentials: Credentials,

    /// Shared HTTP client with connection pooling
    http: Client,

    /// Base API URL, overridable for tests and proxies
    base_url: String,

    timeout: Duration,
}

impl BitbucketClient {
    /// Creates a client with the default timeout.
    pub fn new(workspace: String, credentials: Credentials) -> Self {
        Self::with_timeout(
            workspace,
            credentials,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        )
    }

    /// Creates a client with a custom per-request timeout. A timed-out call
    /// fails the repository being processed, never the whole run.
    pub fn with_timeout(workspace: String, credentials: Credentials, timeout: Duration) -> Self {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            workspace,
            credentials,
            http,
            base_url: DEFAULT_API_BASE.to_string(),
            timeout,
        }
    }

    /// Overrides the API base URL (for tests or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn repo_url(&self, repository: &str, tail: &str) -> String {
        format!(
            "{}/repositories/{}/{}/{}",
            self.base_url, self.workspace, repository, tail
        )
    }

    fn authenticated(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.app_password))
    }

    fn transport_error(&self, error: reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            RemoteError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else if error.is_connect() {
            RemoteError::Network {
                message: format!("connection failed: {}", error),
            }
        } else {
            RemoteError::Network {
                message: format!("request failed: {}", error),
            }
        }
    }
}

/// Extracts the API error message from a non-success response. Bitbucket
/// wraps failures as `{"error": {"message": ...}}`; anything else is passed
/// through as raw body text.
async fn api_error(response: Response) -> RemoteError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    RemoteError::Api { status, message }
}

/// Builds the form fields for a `src` commit: one field per file plus the
/// commit message and target branch.
fn commit_form(files: &[FileChange], message: &str, branch: &str) -> Vec<(String, String)> {
    let mut fields: Vec<(String, String)> = files
        .iter()
        .map(|file| (file.path.clone(), file.content.clone()))
        .collect();
    fields.push(("message".to_string(), message.to_string()));
    fields.push(("branch".to_string(), branch.to_string()));
    fields
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitPage {
    values: Vec<CommitEntry>,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    hash: String,
}

#[derive(Debug, Serialize)]
struct BranchPayload<'a> {
    name: &'a str,
    target: BranchTarget<'a>,
}

#[derive(Debug, Serialize)]
struct BranchTarget<'a> {
    hash: &'a str,
}

#[derive(Debug, Serialize)]
struct PullRequestPayload<'a> {
    title: &'a str,
    description: &'a str,
    source: BranchRef<'a>,
    destination: BranchRef<'a>,
    reviewers: Vec<ReviewerRef<'a>>,
    close_source_branch: bool,
}

#[derive(Debug, Serialize)]
struct BranchRef<'a> {
    branch: BranchName<'a>,
}

#[derive(Debug, Serialize)]
struct BranchName<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct ReviewerRef<'a> {
    account_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PullRequestResponse {
    id: u64,
    links: PullRequestLinks,
}

#[derive(Debug, Deserialize)]
struct PullRequestLinks {
    html: Link,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

#[async_trait]
impl RemoteVcs for BitbucketClient {
    async fn latest_commit(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Option<String>, RemoteError> {
        let url = self.repo_url(repository, "commits");
        debug!(repository, branch, "fetching latest commit");

        let response = self
            .authenticated(self.http.get(&url))
            .query(&[("include", branch)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let page: CommitPage = response.json().await.map_err(|e| RemoteError::InvalidResponse {
            message: format!("commit list parse error: {}", e),
        })?;

        Ok(page.values.into_iter().next().map(|entry| entry.hash))
    }

    async fn fetch_file(
        &self,
        repository: &str,
        commit: &str,
        path: &str,
    ) -> Result<Option<String>, RemoteError> {
        let url = self.repo_url(repository, &format!("src/{}/{}", commit, path));
        debug!(repository, path, "fetching file content");

        let response = self
            .authenticated(self.http.get(&url))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(repository, path, "file not found at commit");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let content = response.text().await.map_err(|e| RemoteError::InvalidResponse {
            message: format!("file body read error: {}", e),
        })?;
        Ok(Some(content))
    }

    async fn create_branch(
        &self,
        repository: &str,
        name: &str,
        target: &str,
    ) -> Result<(), RemoteError> {
        let url = self.repo_url(repository, "refs/branches");
        debug!(repository, branch = name, target, "creating branch");

        let payload = BranchPayload {
            name,
            target: BranchTarget { hash: target },
        };

        let response = self
            .authenticated(self.http.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        info!(repository, branch = name, "branch created");
        Ok(())
    }

    async fn commit_files(
        &self,
        repository: &str,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> Result<(), RemoteError> {
        let url = self.repo_url(repository, "src");
        debug!(repository, branch, files = files.len(), "committing files");

        let response = self
            .authenticated(self.http.post(&url))
            .form(&commit_form(files, message, branch))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        info!(repository, branch, files = files.len(), "files committed");
        Ok(())
    }

    async fn open_pull_request(
        &self,
        repository: &str,
        request: &NewPullRequest,
    ) -> Result<PullRequest, RemoteError> {
        let url = self.repo_url(repository, "pullrequests");
        debug!(
            repository,
            source = %request.source_branch,
            destination = %request.destination_branch,
            "opening pull request"
        );

        let payload = PullRequestPayload {
            title: &request.title,
            description: &request.description,
            source: BranchRef {
                branch: BranchName {
                    name: &request.source_branch,
                },
            },
            destination: BranchRef {
                branch: BranchName {
                    name: &request.destination_branch,
                },
            },
            reviewers: request
                .reviewers
                .iter()
                .map(|account_id| ReviewerRef { account_id })
                .collect(),
            close_source_branch: true,
        };

        let response = self
            .authenticated(self.http.post(&url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let opened: PullRequestResponse =
            response.json().await.map_err(|e| RemoteError::InvalidResponse {
                message: format!("pull request parse error: {}", e),
            })?;

        info!(repository, id = opened.id, url = %opened.links.html.href, "pull request opened");
        Ok(PullRequest {
            id: opened.id,
            url: opened.links.html.href,
        })
    }
}
