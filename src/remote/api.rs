//! Remote VCS abstraction layer
//!
//! All remote implementations must implement the [`RemoteVcs`] trait. The
//! engine only ever performs the five operations below, and every side effect
//! it causes goes through this seam, which is what makes the orchestrator and
//! submitter testable without a network.

use async_trait::async_trait;
use thiserror::Error;

/// Branch names probed, in order, when resolving a repository's default
/// branch.
pub const DEFAULT_BRANCHES: &[&str] = &["main", "master"];

/// Errors that can occur while talking to the remote API.
///
/// None of these are retried; a failed operation fails the repository being
/// processed and the run moves on.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The request did not complete within the client timeout.
    #[error("request timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Connection-level failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// The API answered successfully but the body was not what we expected.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },
}

/// The tip of a repository's default branch, resolved once per repository and
/// used both to fetch file contents and as the base for the review branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryHead {
    pub branch: String,
    pub commit: String,
}

/// One file's new content, committed onto the review branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

/// Everything needed to open a pull request. Constructed by the submitter and
/// consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest {
    pub title: String,
    pub description: String,
    pub source_branch: String,
    pub destination_branch: String,
    /// Reviewer account ids, passed through opaquely.
    pub reviewers: Vec<String>,
}

/// An opened pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub id: u64,
    pub url: String,
}

/// Core trait for remote version-control backends.
///
/// Read operations return `Ok(None)` for plain absence (unknown branch,
/// missing file); `Err` is reserved for transport and API failures. Write
/// operations are irreversible from the engine's perspective once issued:
/// nothing here rolls back a branch or commit when a later call fails.
#[async_trait]
pub trait RemoteVcs: Send + Sync {
    /// Hash of the most recent commit on `branch`, or `None` when the branch
    /// does not exist or has no commits.
    async fn latest_commit(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Option<String>, RemoteError>;

    /// Content of `path` at `commit`, or `None` when the file is absent.
    async fn fetch_file(
        &self,
        repository: &str,
        commit: &str,
        path: &str,
    ) -> Result<Option<String>, RemoteError>;

    /// Creates branch `name` pointing at commit `target`.
    async fn create_branch(
        &self,
        repository: &str,
        name: &str,
        target: &str,
    ) -> Result<(), RemoteError>;

    /// Commits the given file contents onto `branch` as a single change.
    async fn commit_files(
        &self,
        repository: &str,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> Result<(), RemoteError>;

    /// Opens a pull request and returns its identifier and URL.
    async fn open_pull_request(
        &self,
        repository: &str,
        request: &NewPullRequest,
    ) -> Result<PullRequest, RemoteError>;

    /// Resolves the repository's default branch by probing `main` then
    /// `master` for a latest commit. `None` means neither branch has any
    /// commits.
    async fn resolve_head(&self, repository: &str) -> Result<Option<RepositoryHead>, RemoteError> {
        for branch in DEFAULT_BRANCHES {
            if let Some(commit) = self.latest_commit(repository, branch).await? {
                return Ok(Some(RepositoryHead {
                    branch: (*branch).to_string(),
                    commit,
                }));
            }
        }
        Ok(None)
    }
}
