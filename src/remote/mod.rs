//! Remote version-control collaborators
//!
//! The engine talks to the outside world through the [`api::RemoteVcs`]
//! trait: fetching file contents at a commit and driving branch, commit and
//! pull-request operations. [`bitbucket`] is the production implementation
//! against the Bitbucket Cloud 2.0 REST API; tests substitute an in-memory
//! implementation.

pub mod api;
pub mod bitbucket;

// Re-export commonly used types
pub use api::{FileChange, NewPullRequest, PullRequest, RemoteError, RemoteVcs, RepositoryHead};
pub use bitbucket::BitbucketClient;
