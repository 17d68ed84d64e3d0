//! Version string replacement across a file set
//!
//! Files are processed one at a time. Each rewrite goes through a temporary
//! file in the same directory that is renamed over the original, so a file is
//! either fully rewritten or left untouched.

use crate::error::{AnnounceError, Result};
use crate::files::resolver::FileTarget;
use regex::bytes::{NoExpand, Regex, RegexBuilder};
use std::borrow::Cow;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A file that could not be rewritten
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a replacement run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementReport {
    /// Files whose content actually changed
    pub changed: Vec<PathBuf>,
    pub failed: Vec<ReplacementFailure>,
}

/// Overall outcome of a replacement run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementOutcome {
    /// No file contained the version; not an error
    NothingChanged,
    Changed(usize),
    /// At least one file could not be rewritten
    PartialFailure { changed: usize, failed: usize },
}

impl ReplacementReport {
    pub fn outcome(&self) -> ReplacementOutcome {
        match (self.changed.len(), self.failed.len()) {
            (0, 0) => ReplacementOutcome::NothingChanged,
            (changed, 0) => ReplacementOutcome::Changed(changed),
            (changed, failed) => ReplacementOutcome::PartialFailure { changed, failed },
        }
    }

    /// Turn per-file failures into a `PartialReplacementFailure` error
    pub fn into_result(self) -> Result<Vec<PathBuf>> {
        if self.failed.is_empty() {
            return Ok(self.changed);
        }

        Err(AnnounceError::PartialReplacementFailure {
            failed: self.failed.len(),
            changed: self.changed.len(),
        })
    }
}

/// Rewrites one version string to another
#[derive(Debug, Clone)]
pub struct TextReplacer {
    pattern: Regex,
    to: String,
}

impl TextReplacer {
    /// Build a case-insensitive literal matcher for `from`.
    pub fn new(from: &str, to: &str) -> Result<Self> {
        if from.is_empty() {
            return Err(AnnounceError::InvalidCurrentVersion(
                "cannot replace an empty version string".to_string(),
            ));
        }

        let pattern = RegexBuilder::new(&regex::escape(from))
            .case_insensitive(true)
            .build()
            .map_err(|e| AnnounceError::InvalidCurrentVersion(e.to_string()))?;

        Ok(TextReplacer {
            pattern,
            to: to.to_string(),
        })
    }

    /// Apply the replacement to a buffer. Manifests get the first match only.
    ///
    /// Returns `None` when nothing changed.
    pub fn replace_in<'a>(&self, content: &'a [u8], is_manifest: bool) -> Option<Vec<u8>> {
        let replaced: Cow<'a, [u8]> = if is_manifest {
            self.pattern.replacen(content, 1, NoExpand(self.to.as_bytes()))
        } else {
            self.pattern.replace_all(content, NoExpand(self.to.as_bytes()))
        };

        match replaced {
            Cow::Owned(bytes) if bytes.as_slice() != content => Some(bytes),
            _ => None,
        }
    }

    /// Rewrite a single file. Returns whether the file changed.
    pub fn replace_in_file(&self, target: &FileTarget) -> Result<bool> {
        let content = fs::read(&target.path)?;
        match self.replace_in(&content, target.is_manifest) {
            Some(updated) => {
                write_atomically(&target.path, &updated)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Rewrite every target in order, collecting failures instead of stopping.
    pub fn replace_all(&self, targets: &[FileTarget]) -> ReplacementReport {
        let mut report = ReplacementReport::default();

        for (index, target) in targets.iter().enumerate() {
            debug!(
                file = %target.path.display(),
                progress = index + 1,
                total = targets.len(),
                "processing"
            );

            match self.replace_in_file(target) {
                Ok(true) => report.changed.push(target.path.clone()),
                Ok(false) => {}
                Err(e) => {
                    warn!(file = %target.path.display(), error = %e, "could not bump version");
                    report.failed.push(ReplacementFailure {
                        path: target.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            changed = report.changed.len(),
            failed = report.failed.len(),
            "version replacement finished"
        );
        report
    }
}

/// Replace `from` with `to` in every file, sequentially.
pub fn replace_version_in_files(
    files: &[FileTarget],
    from: &str,
    to: &str,
) -> Result<ReplacementReport> {
    Ok(TextReplacer::new(from, to)?.replace_all(files))
}

/// Write `content` to `path` through a temporary sibling file that is renamed
/// into place, keeping the original permissions.
pub fn write_atomically(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let permissions = fs::metadata(path).ok().map(|m| m.permissions());

    let mut temp = NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        fs::set_permissions(temp.path(), permissions)?;
    }

    temp.persist(path).map_err(|e| AnnounceError::Io(e.error))?;
    Ok(())
}
