//! Configuration management for pipeprune
//!
//! The run configuration is a JSON file naming the Bitbucket workspace, the
//! repositories to process, the obsolete steps (with the files each may
//! appear in) and the reviewers to attach to every pull request:
//!
//! ```json
//! {
//!   "workspace": "acme",
//!   "repositories": ["service-a", "service-b"],
//!   "steps": [{"name": "deploy-legacy", "files": ["bitbucket-pipelines.yml"]}],
//!   "reviewers": [{"account_id": "557058:aaaa-bbbb"}]
//! }
//! ```
//!
//! The configuration is loaded once at process start, validated, and passed
//! by reference into the orchestrator. Nothing reads it through globals.
//!
//! Credentials are separate from the file and come from the environment:
//! `BITBUCKET_USERNAME` and `BITBUCKET_APP_PASSWORD`. They are treated as
//! opaque and never logged.

use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const USERNAME_VAR: &str = "BITBUCKET_USERNAME";
const APP_PASSWORD_VAR: &str = "BITBUCKET_APP_PASSWORD";

/// Configuration errors. All of these are fatal to the whole run and are
/// reported before any repository is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("workspace must not be empty")]
    EmptyWorkspace,

    #[error("step name must not be empty")]
    EmptyStepName,

    #[error("step '{0}' lists no files")]
    StepWithoutFiles(String),

    #[error("duplicate step name '{0}'")]
    DuplicateStepName(String),

    #[error("reviewer account id must not be empty")]
    EmptyReviewerId,

    #[error("environment variable {0} not set")]
    MissingEnvVar(&'static str),
}

/// A named build step slated for removal, together with the relative paths of
/// the files it may be declared in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ObsoleteStep {
    pub name: String,
    pub files: Vec<String>,
}

/// A reviewer to attach to every opened pull request. The account id is an
/// opaque identifier understood by Bitbucket; no local existence check.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Reviewer {
    pub account_id: String,
}

/// Immutable run configuration, owned by the caller for the duration of a
/// run.
#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub workspace: String,
    pub repositories: Vec<String>,
    pub steps: Vec<ObsoleteStep>,
    pub reviewers: Vec<Reviewer>,
}

impl Configuration {
    /// Loads and validates a configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Configuration = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Empty `repositories` or `steps` is a valid no-op run, not an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace.trim().is_empty() {
            return Err(ConfigError::EmptyWorkspace);
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.name.trim().is_empty() {
                return Err(ConfigError::EmptyStepName);
            }
            if step.files.is_empty() {
                return Err(ConfigError::StepWithoutFiles(step.name.clone()));
            }
            if !seen.insert(step.name.as_str()) {
                return Err(ConfigError::DuplicateStepName(step.name.clone()));
            }
        }

        for reviewer in &self.reviewers {
            if reviewer.account_id.trim().is_empty() {
                return Err(ConfigError::EmptyReviewerId);
            }
        }

        Ok(())
    }

    /// Every file path any step is interested in, deduplicated, in first-seen
    /// order. This is the fetch list for each repository and keeps processing
    /// order deterministic across runs.
    pub fn configured_files(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for step in &self.steps {
            for file in &step.files {
                if !paths.contains(&file.as_str()) {
                    paths.push(file.as_str());
                }
            }
        }
        paths
    }
}

/// Opaque credential pair used to authenticate every remote API call.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub app_password: String,
}

impl Credentials {
    /// Reads credentials from `BITBUCKET_USERNAME` / `BITBUCKET_APP_PASSWORD`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let username =
            env::var(USERNAME_VAR).map_err(|_| ConfigError::MissingEnvVar(USERNAME_VAR))?;
        let app_password =
            env::var(APP_PASSWORD_VAR).map_err(|_| ConfigError::MissingEnvVar(APP_PASSWORD_VAR))?;
        Ok(Self {
            username,
            app_password,
        })
    }
}

// The app password must never end up in logs or error output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("app_password", &"<redacted>")
            .finish()
    }
}
