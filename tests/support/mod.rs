//! Shared test support: an in-memory [`RemoteVcs`] implementation that
//! records every write call it receives.

use async_trait::async_trait;
use pipeprune::remote::api::{
    FileChange, NewPullRequest, PullRequest, RemoteError, RemoteVcs,
};
use std::collections::HashMap;
use std::sync::Mutex;

const HEAD_COMMIT: &str = "c0ffee42";

/// A remote write operation observed by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(dead_code)]
pub enum WriteCall {
    CreateBranch {
        repository: String,
        name: String,
        target: String,
    },
    Commit {
        repository: String,
        branch: String,
        message: String,
        files: Vec<String>,
    },
    OpenPullRequest {
        repository: String,
        source: String,
        destination: String,
        reviewers: Vec<String>,
    },
}

/// In-memory remote: repositories with a `main` head commit and a map of
/// file contents. Fetches can be made to fail per repository to exercise
/// failure isolation.
#[derive(Default)]
pub struct MockRemote {
    files: HashMap<String, HashMap<String, String>>,
    fail_fetch: Vec<String>,
    writes: Mutex<Vec<WriteCall>>,
}

#[allow(dead_code)]
impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a repository (with a head commit) without any files.
    pub fn with_repository(mut self, repository: &str) -> Self {
        self.files.entry(repository.to_string()).or_default();
        self
    }

    /// Registers a repository file, creating the repository if needed.
    pub fn with_file(mut self, repository: &str, path: &str, content: &str) -> Self {
        self.files
            .entry(repository.to_string())
            .or_default()
            .insert(path.to_string(), content.to_string());
        self
    }

    /// Makes every file fetch for `repository` fail with a network error.
    pub fn failing_fetch(mut self, repository: &str) -> Self {
        self.fail_fetch.push(repository.to_string());
        self
    }

    pub fn write_calls(&self) -> Vec<WriteCall> {
        self.writes.lock().unwrap().clone()
    }

    fn record(&self, call: WriteCall) {
        self.writes.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteVcs for MockRemote {
    async fn latest_commit(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Option<String>, RemoteError> {
        if branch == "main" && self.files.contains_key(repository) {
            Ok(Some(HEAD_COMMIT.to_string()))
        } else {
            Ok(None)
        }
    }

    async fn fetch_file(
        &self,
        repository: &str,
        _commit: &str,
        path: &str,
    ) -> Result<Option<String>, RemoteError> {
        if self.fail_fetch.iter().any(|r| r == repository) {
            return Err(RemoteError::Network {
                message: "connection reset by peer".to_string(),
            });
        }
        Ok(self
            .files
            .get(repository)
            .and_then(|files| files.get(path))
            .cloned())
    }

    async fn create_branch(
        &self,
        repository: &str,
        name: &str,
        target: &str,
    ) -> Result<(), RemoteError> {
        self.record(WriteCall::CreateBranch {
            repository: repository.to_string(),
            name: name.to_string(),
            target: target.to_string(),
        });
        Ok(())
    }

    async fn commit_files(
        &self,
        repository: &str,
        branch: &str,
        message: &str,
        files: &[FileChange],
    ) -> Result<(), RemoteError> {
        self.record(WriteCall::Commit {
            repository: repository.to_string(),
            branch: branch.to_string(),
            message: message.to_string(),
            files: files.iter().map(|f| f.path.clone()).collect(),
        });
        Ok(())
    }

    async fn open_pull_request(
        &self,
        repository: &str,
        request: &NewPullRequest,
    ) -> Result<PullRequest, RemoteError> {
        self.record(WriteCall::OpenPullRequest {
            repository: repository.to_string(),
            source: request.source_branch.clone(),
            destination: request.destination_branch.clone(),
            reviewers: request.reviewers.clone(),
        });
        Ok(PullRequest {
            id: 1,
            url: format!("https://bitbucket.org/acme/{}/pull-requests/1", repository),
        })
    }
}
