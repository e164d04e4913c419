//! Sequential repository loop
//!
//! Each repository moves through Fetching -> Pruning -> (NoChange |
//! Submitting -> Submitted | Failed). There are no retries between states; a
//! failure anywhere transitions the repository to Failed and the loop moves
//! on to the next one. Repositories share no mutable state, so this loop
//! could be fanned out task-per-repository without extra locking.

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, info};

use crate::config::Configuration;
use crate::prune::RepositoryChangeSet;
use crate::remote::api::RemoteVcs;
use crate::submit::{ReviewSubmitter, RunToken};

use super::summary::{RepositoryStatus, RunSummary};

pub struct PruningOrchestrator<'a> {
    remote: &'a dyn RemoteVcs,
    config: &'a Configuration,
    dry_run: bool,
}

impl<'a> PruningOrchestrator<'a> {
    pub fn new(remote: &'a dyn RemoteVcs, config: &'a Configuration, dry_run: bool) -> Self {
        Self {
            remote,
            config,
            dry_run,
        }
    }

    /// Processes every configured repository in order and returns one outcome
    /// per repository. Never fails as a whole: repository-level errors are
    /// recorded in the summary instead of propagating.
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::new();

        if self.config.repositories.is_empty() || self.config.steps.is_empty() {
            info!("no repositories or steps configured, nothing to do");
            return summary;
        }

        let token = RunToken::generate();
        info!(
            repositories = self.config.repositories.len(),
            steps = self.config.steps.len(),
            run = %token.id,
            dry_run = self.dry_run,
            "starting pruning run"
        );

        for repository in &self.config.repositories {
            let status = match self.process_repository(repository, &token).await {
                Ok(status) => status,
                Err(err) => {
                    let reason = format!("{:#}", err);
                    error!(repository, error = %reason, "repository failed");
                    RepositoryStatus::Failed { reason }
                }
            };
            summary.record(repository, status);
        }

        info!(
            total = summary.len(),
            failed = summary.failed_count(),
            "run complete"
        );
        summary
    }

    async fn process_repository(
        &self,
        repository: &str,
        token: &RunToken,
    ) -> Result<RepositoryStatus> {
        info!(repository, "processing repository");

        let head = self
            .remote
            .resolve_head(repository)
            .await
            .context("resolving default branch")?
            .ok_or_else(|| anyhow!("no commits found on 'main' or 'master'"))?;
        debug!(repository, branch = %head.branch, commit = %head.commit, "resolved default branch");

        // A configured file that is missing likely indicates a configuration
        // error, so it fails the repository rather than being skipped.
        let mut files = Vec::new();
        for path in self.config.configured_files() {
            let content = self
                .remote
                .fetch_file(repository, &head.commit, path)
                .await
                .with_context(|| format!("fetching '{}'", path))?
                .ok_or_else(|| anyhow!("configured file '{}' not found in repository", path))?;
            files.push((path.to_string(), content));
        }

        let changeset = RepositoryChangeSet::build(repository, &files, &self.config.steps);
        if !changeset.has_changes() {
            info!(repository, "no obsolete steps present");
            return Ok(RepositoryStatus::NoChange);
        }

        let modified: Vec<String> = changeset
            .modified_edits()
            .map(|edit| edit.path.clone())
            .collect();
        info!(repository, files = ?modified, steps = ?changeset.removed_steps(), "pruned obsolete steps");

        if self.dry_run {
            return Ok(RepositoryStatus::DryRun { files: modified });
        }

        let submitter = ReviewSubmitter::new(self.remote, &self.config.reviewers, token);
        let pull_request = submitter
            .submit(&changeset, &head)
            .await
            .context("submitting changes for review")?;

        Ok(RepositoryStatus::Submitted {
            url: pull_request.url,
        })
    }
}
