use crate::error::{AnnounceError, Result};
use crate::files::ignore_rules::{compile_ignore_rules, IgnoreRules};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Basename prefixes of manifest files that only get their first match replaced
pub const DEFAULT_MANIFEST_PREFIXES: &[&str] = &["package", "npm"];

/// Name of the ignore-rule file read from the project root
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// A file that may carry the version string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileTarget {
    pub path: PathBuf,
    pub is_manifest: bool,
}

impl FileTarget {
    /// Classify a path against a list of manifest basename prefixes
    pub fn classify(path: PathBuf, manifest_prefixes: &[String]) -> Self {
        let is_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| {
                let name = name.trim();
                manifest_prefixes
                    .iter()
                    .any(|prefix| name.starts_with(prefix.as_str()))
            })
            .unwrap_or(false);

        FileTarget { path, is_manifest }
    }
}

/// Crawls a project tree and keeps the files the ignore rules accept
#[derive(Debug, Clone)]
pub struct FileSetResolver {
    ignore_folders: Vec<String>,
    manifest_prefixes: Vec<String>,
}

impl Default for FileSetResolver {
    fn default() -> Self {
        FileSetResolver {
            ignore_folders: Vec::new(),
            manifest_prefixes: DEFAULT_MANIFEST_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl FileSetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folder names excluded in addition to the ignore file
    pub fn with_ignore_folders(mut self, folders: Vec<String>) -> Self {
        self.ignore_folders = folders;
        self
    }

    pub fn with_manifest_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.manifest_prefixes = prefixes;
        self
    }

    /// Read `<root>/.gitignore`, compile it and crawl the tree.
    ///
    /// Fails with `IgnoreFileUnreadable` rather than returning an unfiltered
    /// file list when the ignore file cannot be read.
    pub fn resolve(&self, root: &Path) -> Result<Vec<FileTarget>> {
        let root = root.canonicalize()?;
        let ignore_path = root.join(IGNORE_FILE_NAME);
        let source = fs::read_to_string(&ignore_path).map_err(|source| {
            AnnounceError::IgnoreFileUnreadable {
                path: ignore_path.clone(),
                source,
            }
        })?;

        let rules = compile_ignore_rules(&source, &self.ignore_folders, &root)?;
        Ok(self.crawl(&rules))
    }

    /// Walk every regular file under the rules' root, pruning ignored
    /// directories. Symlinks are not followed.
    pub fn crawl(&self, rules: &IgnoreRules) -> Vec<FileTarget> {
        let walker = WalkDir::new(rules.root())
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !rules.is_ignored_entry(entry.path(), entry.file_type().is_dir())
            });

        let mut targets = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            targets.push(FileTarget::classify(
                entry.into_path(),
                &self.manifest_prefixes,
            ));
        }

        debug!(files = targets.len(), root = %rules.root().display(), "resolved file set");
        targets
    }
}

/// Resolve the files under `root` that may have the version rewritten.
pub fn resolve_file_set(root: &Path, ignore_folders: &[String]) -> Result<Vec<FileTarget>> {
    FileSetResolver::new()
        .with_ignore_folders(ignore_folders.to_vec())
        .resolve(root)
}
