//! pipeprune - automated removal of obsolete CI build steps
//!
//! This library removes named build steps from the Bitbucket Pipelines
//! configuration files of a fleet of repositories and submits each
//! repository's aggregated change for review as a single pull request.
//!
//! # Core Concepts
//!
//! - **Step block**: the contiguous declaration of one step inside a
//!   pipeline file, located by text/line matching rather than a YAML model
//! - **Change set**: the per-repository collection of file edit results for
//!   one run; only change sets with actual modifications are published
//! - **Remote VCS**: the [`remote::api::RemoteVcs`] trait boundary through
//!   which all network side effects flow (Bitbucket Cloud in production,
//!   in-memory fakes in tests)
//!
//! # Example Usage
//!
//! ```ignore
//! use pipeprune::{BitbucketClient, Configuration, Credentials, PruningOrchestrator};
//! use std::path::Path;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::from_env()?;
//! let config = Configuration::load(Path::new("config.json"))?;
//!
//! let client = BitbucketClient::new(config.workspace.clone(), credentials);
//! let orchestrator = PruningOrchestrator::new(&client, &config, false);
//!
//! let summary = orchestrator.run().await;
//! for outcome in summary.outcomes() {
//!     println!("{}: {}", outcome.repository, outcome.status);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Project Structure
//!
//! - [`prune`]: step location, per-file removal, per-repository change sets
//! - [`remote`]: the remote VCS trait and the Bitbucket Cloud client
//! - [`submit`]: branch/commit/pull-request submission
//! - [`run`]: the repository loop and the run summary

// Public modules
pub mod cli;
pub mod config;
pub mod prune;
pub mod remote;
pub mod run;
pub mod submit;
pub mod util;

// Re-export key types for convenient access
pub use config::{ConfigError, Configuration, Credentials, ObsoleteStep, Reviewer};
pub use prune::{FileEdit, RepositoryChangeSet};
pub use remote::{BitbucketClient, RemoteError, RemoteVcs};
pub use run::{PruningOrchestrator, RepositoryOutcome, RepositoryStatus, RunSummary};
pub use submit::{ReviewSubmitter, RunToken, SubmitError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_pipeprune() {
        assert_eq!(NAME, "pipeprune");
    }
}
