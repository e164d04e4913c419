//! Step block location inside pipeline configuration text
//!
//! A step is declared by a line of the form `- step: <name>`, where `<name>`
//! may also be written as a YAML anchor (`&name`) or alias (`*name`). Given a
//! step name and the full text of a file, [`locate`] returns the span of the
//! first matching declaration block.
//!
//! # Block boundary rule
//!
//! A block starts at its declaration line and extends to (but excludes) the
//! first later line that is either:
//!
//! - a sibling `- step:` declaration at the same indentation, or
//! - any non-blank, non-comment line at strictly smaller indentation
//!   (the block's enclosing section ends there),
//!
//! or to end-of-file if neither occurs. Blank lines and `#` comments never
//! terminate a block.
//!
//! If the same step name is declared more than once, the first occurrence
//! wins. Callers that want the later occurrences must remove the first one
//! and search again.

use regex::Regex;

/// Marker used on a step declaration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// Bare name: `- step: build`
    Plain,
    /// YAML anchor definition: `- step: &build`
    Anchor,
    /// YAML alias reference: `- step: *build`
    Alias,
}

/// Half-open byte range of a step block, aligned to line starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A located step declaration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepMatch {
    pub span: Span,
    pub kind: DeclKind,
}

/// Finds the first block declaring `step_name` in `text`.
///
/// Returns `None` when no declaration with that name exists. Absence is an
/// expected outcome, not an error: a step need not appear in every file it is
/// configured for.
///
/// This is a pure function of its inputs.
pub fn locate(step_name: &str, text: &str) -> Option<StepMatch> {
    locate_matching(step_name, text, |_| true)
}

/// Finds the first block *referencing* `step_name` through a YAML alias
/// (`- step: *name`). Used to sweep dangling references after an anchor
/// block has been removed.
pub fn locate_alias(step_name: &str, text: &str) -> Option<StepMatch> {
    locate_matching(step_name, text, |kind| kind == DeclKind::Alias)
}

fn locate_matching(
    step_name: &str,
    text: &str,
    accept: impl Fn(DeclKind) -> bool,
) -> Option<StepMatch> {
    let decl_re = declaration_re();
    let lines = split_lines(text);

    for (i, (offset, line)) in lines.iter().enumerate() {
        let Some((indent, kind, name)) = parse_declaration(&decl_re, line) else {
            continue;
        };
        if name != step_name || !accept(kind) {
            continue;
        }
        let end = block_end(&lines[i + 1..], indent, text.len());
        return Some(StepMatch {
            span: Span {
                start: *offset,
                end,
            },
            kind,
        });
    }

    None
}

/// Matches a step declaration line: indentation, `- step:`, a single
/// name/anchor/alias token, optionally followed by a trailing comment.
fn declaration_re() -> Regex {
    Regex::new(r"^([ \t]*)- step:[ \t]*([&*]?[^\s#]+)[ \t]*(?:#.*)?$").expect("valid regex")
}

/// Splits `text` into `(byte offset, line)` pairs; lines keep their newline.
fn split_lines(text: &str) -> Vec<(usize, &str)> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        lines.push((offset, line));
        offset += line.len();
    }
    lines
}

fn parse_declaration<'t>(decl_re: &Regex, line: &'t str) -> Option<(usize, DeclKind, &'t str)> {
    let caps = decl_re.captures(line.trim_end())?;
    let indent = caps.get(1).map_or(0, |m| m.as_str().len());
    let token = caps.get(2)?.as_str();

    let (kind, name) = if let Some(name) = token.strip_prefix('&') {
        (DeclKind::Anchor, name)
    } else if let Some(name) = token.strip_prefix('*') {
        (DeclKind::Alias, name)
    } else {
        (DeclKind::Plain, token)
    };

    if name.is_empty() {
        return None;
    }
    Some((indent, kind, name))
}

/// Scans past the declaration line for the first line that terminates the
/// block, returning its byte offset (or `eof` when the block runs to the end
/// of the file).
fn block_end(rest: &[(usize, &str)], decl_indent: usize, eof: usize) -> usize {
    for (offset, line) in rest {
        let body = line.trim_end();
        let trimmed = body.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let indent = body.len() - trimmed.len();
        if indent < decl_indent {
            return *offset;
        }
        if indent == decl_indent && trimmed.starts_with("- step:") {
            return *offset;
        }
    }
    eof
}
