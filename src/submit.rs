//! Publishing a repository's change set for review
//!
//! Given a change set with at least one modified file, the submitter creates
//! a review branch off the default branch tip, commits every modified file in
//! one change, and opens a pull request with the configured reviewers.
//!
//! Remote side effects are irreversible from here: if the pull-request call
//! fails after the branch was pushed, the branch is left behind and the
//! failure is reported. Cleanup is manual.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Reviewer;
use crate::prune::RepositoryChangeSet;
use crate::remote::api::{FileChange, NewPullRequest, PullRequest, RemoteError, RemoteVcs, RepositoryHead};

#[derive(Debug, Error)]
pub enum SubmitError {
    /// Submitting an unchanged change set is a programming error upstream,
    /// signaled here rather than silently producing an empty pull request.
    #[error("repository '{0}' has no modified files to submit")]
    NoChanges(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Identifies one run. The token goes into every branch name so that
/// concurrent runs against the same repository can never collide.
#[derive(Debug, Clone)]
pub struct RunToken {
    pub id: String,
    pub started_at: DateTime<Utc>,
}

impl RunToken {
    pub fn generate() -> Self {
        let id = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            id,
            started_at: Utc::now(),
        }
    }

    /// Review branch name for this run, e.g. `prune-steps/20260807143501-a1b2c3d4`.
    pub fn branch_name(&self) -> String {
        format!(
            "prune-steps/{}-{}",
            self.started_at.format("%Y%m%d%H%M%S"),
            self.id
        )
    }
}

/// Drives branch creation, commit and pull-request submission for change
/// sets that actually contain changes.
pub struct ReviewSubmitter<'a> {
    remote: &'a dyn RemoteVcs,
    reviewers: &'a [Reviewer],
    token: &'a RunToken,
}

impl<'a> ReviewSubmitter<'a> {
    pub fn new(remote: &'a dyn RemoteVcs, reviewers: &'a [Reviewer], token: &'a RunToken) -> Self {
        Self {
            remote,
            reviewers,
            token,
        }
    }

    /// Submits the change set as one branch + one commit + one pull request.
    ///
    /// Precondition: `changeset.has_changes()`.
    pub async fn submit(
        &self,
        changeset: &RepositoryChangeSet,
        head: &RepositoryHead,
    ) -> Result<PullRequest, SubmitError> {
        if !changeset.has_changes() {
            return Err(SubmitError::NoChanges(changeset.repository.clone()));
        }

        let repository = changeset.repository.as_str();
        let steps = changeset.removed_steps();
        let branch = self.token.branch_name();
        let title = pr_title(&steps);

        debug!(repository, branch = %branch, base = %head.branch, "creating review branch");
        self.remote
            .create_branch(repository, &branch, &head.commit)
            .await?;

        let files: Vec<FileChange> = changeset
            .modified_edits()
            .map(|edit| FileChange {
                path: edit.path.clone(),
                content: edit.new_content.clone(),
            })
            .collect();
        self.remote
            .commit_files(repository, &branch, &title, &files)
            .await?;

        let request = NewPullRequest {
            description: pr_description(changeset, self.token),
            title,
            source_branch: branch,
            destination_branch: head.branch.clone(),
            reviewers: self
                .reviewers
                .iter()
                .map(|reviewer| reviewer.account_id.clone())
                .collect(),
        };
        let pull_request = self.remote.open_pull_request(repository, &request).await?;

        info!(repository, url = %pull_request.url, "pull request opened for review");
        Ok(pull_request)
    }
}

fn pr_title(steps: &[&str]) -> String {
    format!("Remove obsolete pipeline steps: {}", steps.join(", "))
}

fn pr_description(changeset: &RepositoryChangeSet, token: &RunToken) -> String {
    let mut body = String::from(
        "Removes obsolete CI build steps from the pipeline configuration.\n\n",
    );
    for edit in changeset.modified_edits() {
        let removed: Vec<&str> = edit.removed_steps.iter().map(String::as_str).collect();
        let _ = writeln!(body, "- `{}`: removed `{}`", edit.path, removed.join("`, `"));
    }
    let _ = write!(
        body,
        "\nOpened by pipeprune run {} ({}).",
        token.started_at.format("%Y-%m-%d %H:%M UTC"),
        token.id
    );
    body
}
