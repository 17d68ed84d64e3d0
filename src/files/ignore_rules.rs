//! Gitignore-style rules compiled into a path predicate
//!
//! Rule lines are normalized before compilation: anything not already anchored
//! (leading `/` or `**/`) is made to match at any depth, so a rule written for
//! the project root also catches the same name in nested packages. The VCS
//! metadata directory and caller-supplied folders are appended as extra rules.
//!
//! Matching is delegated to the `ignore` crate's gitignore implementation:
//! later rules win, `!` re-includes, trailing `/` only matches directories.

use crate::error::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Rule always appended for the VCS metadata directory
pub const VCS_METADATA_RULE: &str = "**/.git";

/// One normalized rule line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// Rule text as compiled, including any `!` prefix
    pub pattern: String,
    pub anchored: bool,
    pub negated: bool,
    pub directory_only: bool,
    /// Position in the compiled rule list; later rules override earlier ones
    pub order: usize,
}

/// Compiled, immutable rule set rooted at a project directory
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    rules: Vec<IgnoreRule>,
    matcher: Gitignore,
}

impl IgnoreRules {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Whether the entry itself is ignored, without looking at its parents.
    ///
    /// Suitable for a crawler that has already pruned ignored directories.
    pub fn is_ignored_entry(&self, path: &Path, is_dir: bool) -> bool {
        self.matcher.matched(path, is_dir).is_ignore()
    }

    /// Whether a path should be kept.
    ///
    /// A path is rejected if any directory between the root and the path is
    /// ignored, or if the path itself is. Paths outside the root are rejected.
    pub fn accepts(&self, path: &Path, is_dir: bool) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(relative) => relative,
                Err(_) => return false,
            }
        } else {
            path
        };

        let mut parents: Vec<&Path> = relative
            .ancestors()
            .skip(1)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        parents.reverse();

        if parents
            .iter()
            .any(|parent| self.is_ignored_entry(parent, true))
        {
            return false;
        }

        !self.is_ignored_entry(relative, is_dir)
    }
}

/// Rewrite one rule line so it matches at any depth.
///
/// Returns `None` for blank lines and comments.
pub fn normalize_rule(line: &str) -> Option<String> {
    let line = line.trim_end();
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }

    let (negated, body) = match line.strip_prefix('!') {
        Some(body) => (true, body),
        None => (false, line),
    };

    if body.starts_with('/') || body.starts_with("**/") {
        return Some(line.to_string());
    }

    let prefix = if negated { "!" } else { "" };
    Some(format!("{}**/{}", prefix, body))
}

/// Compile ignore-rule source text plus extra folders into a predicate.
pub fn compile_ignore_rules(
    source: &str,
    ignore_folders: &[String],
    root: &Path,
) -> Result<IgnoreRules> {
    let synthetic = std::iter::once(VCS_METADATA_RULE).chain(ignore_folders.iter().map(String::as_str));

    let mut builder = GitignoreBuilder::new(root);
    let mut rules = Vec::new();

    for line in source.lines().chain(synthetic) {
        let Some(pattern) = normalize_rule(line) else {
            continue;
        };

        builder.add_line(None, &pattern)?;

        let negated = pattern.starts_with('!');
        let body = pattern.trim_start_matches('!');
        rules.push(IgnoreRule {
            anchored: body.starts_with('/'),
            directory_only: body.ends_with('/'),
            negated,
            order: rules.len(),
            pattern,
        });
    }

    let matcher = builder.build()?;
    debug!(rules = rules.len(), root = %root.display(), "compiled ignore rules");

    Ok(IgnoreRules {
        root: root.to_path_buf(),
        rules,
        matcher,
    })
}
