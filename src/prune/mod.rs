//! Locating and removing obsolete build steps from pipeline configuration text
//!
//! This module is deliberately text-based: pipeline files are treated as
//! indented line-oriented text, not as a parsed YAML document. Matching
//! happens at the granularity of a whole step block (declaration line through
//! the end of its indented body).

pub mod changeset;
pub mod matcher;
pub mod pruner;

// Re-export commonly used types
pub use changeset::RepositoryChangeSet;
pub use matcher::{DeclKind, Span, StepMatch};
pub use pruner::{prune, FileEdit, PruneOutcome};
