//! Applying step removals to a single file's content
//!
//! Removals are applied in configured order against the *current* text: each
//! removal shifts byte offsets, so every lookup runs on the already-updated
//! content rather than the original.

use tracing::debug;

use super::matcher;

/// Result of pruning one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneOutcome {
    /// Content after all removals (equal to the input when nothing matched).
    pub text: String,
    /// Names of the steps whose blocks were removed, in removal order.
    pub removed: Vec<String>,
}

impl PruneOutcome {
    pub fn modified(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Per-file edit result, folded into a repository change set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub path: String,
    pub original_content: String,
    pub new_content: String,
    /// True iff `new_content` differs from `original_content`.
    pub modified: bool,
    pub removed_steps: Vec<String>,
}

impl FileEdit {
    pub fn new(path: String, original_content: String, outcome: PruneOutcome) -> Self {
        let modified = outcome.text != original_content;
        Self {
            path,
            original_content,
            new_content: outcome.text,
            modified,
            removed_steps: outcome.removed,
        }
    }
}

/// Removes the blocks of the given steps from `text`.
///
/// For each name, the first declaration block (plain or anchor) is removed;
/// any alias blocks (`- step: *name`) left behind by that removal are then
/// swept until none remain, so the file does not keep references to a step
/// that no longer exists. A second *plain* declaration of the same name is
/// left untouched.
///
/// Steps that do not occur in the text are skipped silently; a missing step
/// is an expected outcome, not an error.
pub fn prune(text: &str, step_names: &[&str]) -> PruneOutcome {
    let mut current = text.to_string();
    let mut removed = Vec::new();

    for name in step_names {
        let Some(found) = matcher::locate(name, &current) else {
            debug!(step = name, "step not present, nothing to remove");
            continue;
        };
        current.replace_range(found.span.start..found.span.end, "");
        removed.push((*name).to_string());

        while let Some(alias) = matcher::locate_alias(name, &current) {
            current.replace_range(alias.span.start..alias.span.end, "");
        }
    }

    PruneOutcome {
        text: current,
        removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_no_step_matches() {
        let text = "- step: A\n  script: foo\n";
        let outcome = prune(text, &["X", "Y"]);
        assert_eq!(outcome.text, text);
        assert!(!outcome.modified());
        assert!(outcome.removed.is_empty());
    }

    #[test]
    fn test_single_removal_scenario() {
        let text = "- step: A\n  script: foo\n- step: B\n  script: bar\n";
        let outcome = prune(text, &["A"]);
        assert_eq!(outcome.text, "- step: B\n  script: bar\n");
        assert!(outcome.modified());
        assert_eq!(outcome.removed, vec!["A"]);
    }

    #[test]
    fn test_removed_step_is_no_longer_locatable() {
        let text = "- step: A\n  script: foo\n- step: B\n  script: bar\n";
        let outcome = prune(text, &["A"]);
        assert!(matcher::locate("A", &outcome.text).is_none());
        assert!(matcher::locate("B", &outcome.text).is_some());
    }

    #[test]
    fn test_order_independent_for_non_overlapping_blocks() {
        let text = "- step: A\n  script: foo\n- step: B\n  script: bar\n- step: C\n  script: baz\n";
        let forward = prune(text, &["A", "B"]);
        let backward = prune(text, &["B", "A"]);
        assert_eq!(forward.text, backward.text);
        assert_eq!(forward.text, "- step: C\n  script: baz\n");
    }

    #[test]
    fn test_later_lookup_runs_on_updated_text() {
        // Removing A shifts B's offsets; B must still be found and removed.
        let text = "- step: A\n  script: foo\n- step: B\n  script: bar\n";
        let outcome = prune(text, &["A", "B"]);
        assert_eq!(outcome.text, "");
        assert_eq!(outcome.removed, vec!["A", "B"]);
    }

    #[test]
    fn test_anchor_removal_sweeps_aliases() {
        let text = "definitions:\n  steps:\n    - step: &legacy\n      script: old\npipelines:\n  default:\n    - step: *legacy\n    - step: keep\n  nightly:\n    - step: *legacy\n";
        let outcome = prune(text, &["legacy"]);
        assert!(matcher::locate("legacy", &outcome.text).is_none());
        assert!(matcher::locate("keep", &outcome.text).is_some());
        assert_eq!(outcome.removed, vec!["legacy"]);
    }

    #[test]
    fn test_duplicate_plain_declaration_keeps_second() {
        let text = "- step: dup\n  script: one\n- step: dup\n  script: two\n";
        let outcome = prune(text, &["dup"]);
        assert_eq!(outcome.text, "- step: dup\n  script: two\n");
    }

    #[test]
    fn test_file_edit_modified_flag() {
        let text = "- step: A\n  script: foo\n";
        let edit = FileEdit::new("a.yml".into(), text.into(), prune(text, &["A"]));
        assert!(edit.modified);
        assert_eq!(edit.new_content, "");
        assert_eq!(edit.removed_steps, vec!["A"]);

        let untouched = FileEdit::new("a.yml".into(), text.into(), prune(text, &["Z"]));
        assert!(!untouched.modified);
        assert_eq!(untouched.new_content, untouched.original_content);
    }
}
