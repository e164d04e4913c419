//! Per-repository aggregation of file edits
//!
//! A change set is built fresh for each repository in each run, holds the
//! ordered per-file edit results, and decides whether anything publishable
//! came out of pruning. It never outlives the processing of its repository.

use crate::config::ObsoleteStep;

use super::pruner::{self, FileEdit};

#[derive(Debug, Clone)]
pub struct RepositoryChangeSet {
    pub repository: String,
    pub edits: Vec<FileEdit>,
}

impl RepositoryChangeSet {
    /// Prunes each fetched file with the subset of steps that list it, in
    /// configured order. Files no step is interested in are skipped.
    pub fn build(repository: &str, files: &[(String, String)], steps: &[ObsoleteStep]) -> Self {
        let mut edits = Vec::new();

        for (path, content) in files {
            let names: Vec<&str> = steps
                .iter()
                .filter(|step| step.files.iter().any(|f| f == path))
                .map(|step| step.name.as_str())
                .collect();
            if names.is_empty() {
                continue;
            }

            let outcome = pruner::prune(content, &names);
            edits.push(FileEdit::new(path.clone(), content.clone(), outcome));
        }

        Self {
            repository: repository.to_string(),
            edits,
        }
    }

    /// True iff at least one file actually changed. A repository where no
    /// configured step matched anything is a legitimate no-op, not an error.
    pub fn has_changes(&self) -> bool {
        self.edits.iter().any(|edit| edit.modified)
    }

    pub fn modified_edits(&self) -> impl Iterator<Item = &FileEdit> {
        self.edits.iter().filter(|edit| edit.modified)
    }

    /// Names of the steps removed anywhere in this repository, deduplicated,
    /// in first-removal order.
    pub fn removed_steps(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for edit in &self.edits {
            for name in &edit.removed_steps {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(name: &str, files: &[&str]) -> ObsoleteStep {
        ObsoleteStep {
            name: name.to_string(),
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn test_no_matches_has_no_changes() {
        let files = vec![("a.yml".to_string(), "- step: other\n  script: x\n".to_string())];
        let steps = vec![step("X", &["a.yml"])];
        let changeset = RepositoryChangeSet::build("repo", &files, &steps);
        assert!(!changeset.has_changes());
        assert_eq!(changeset.modified_edits().count(), 0);
        assert!(changeset.removed_steps().is_empty());
    }

    #[test]
    fn test_step_applied_only_to_its_files() {
        let files = vec![
            ("a.yml".to_string(), "- step: X\n  script: a\n".to_string()),
            ("b.yml".to_string(), "- step: X\n  script: b\n".to_string()),
        ];
        let steps = vec![step("X", &["a.yml"])];
        let changeset = RepositoryChangeSet::build("repo", &files, &steps);

        assert!(changeset.has_changes());
        let modified: Vec<&str> = changeset.modified_edits().map(|e| e.path.as_str()).collect();
        assert_eq!(modified, vec!["a.yml"]);
    }

    #[test]
    fn test_step_listed_in_multiple_files_applies_independently() {
        let files = vec![
            ("a.yml".to_string(), "- step: X\n  script: a\n- step: keep\n".to_string()),
            ("b.yml".to_string(), "- step: keep\n  script: b\n".to_string()),
        ];
        let steps = vec![step("X", &["a.yml", "b.yml"])];
        let changeset = RepositoryChangeSet::build("repo", &files, &steps);

        // Present in a.yml, absent from b.yml: partial application is fine.
        assert!(changeset.has_changes());
        assert_eq!(changeset.modified_edits().count(), 1);
        assert_eq!(changeset.removed_steps(), vec!["X"]);
    }

    #[test]
    fn test_removed_steps_deduplicated_across_files() {
        let files = vec![
            ("a.yml".to_string(), "- step: X\n  script: a\n".to_string()),
            ("b.yml".to_string(), "- step: X\n  script: b\n".to_string()),
        ];
        let steps = vec![step("X", &["a.yml", "b.yml"])];
        let changeset = RepositoryChangeSet::build("repo", &files, &steps);
        assert_eq!(changeset.removed_steps(), vec!["X"]);
    }

    #[test]
    fn test_irrelevant_files_are_skipped() {
        let files = vec![("other.yml".to_string(), "- step: X\n".to_string())];
        let steps = vec![step("X", &["a.yml"])];
        let changeset = RepositoryChangeSet::build("repo", &files, &steps);
        assert!(changeset.edits.is_empty());
    }
}
