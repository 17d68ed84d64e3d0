//! `prepare`: compute the next version and write it into the project

use crate::config::PrepareConfig;
use crate::domain::{compute_next_version, Ladder, Series};
use crate::error::Result;
use crate::files::{FileSetResolver, ReplacementReport, TextReplacer};
use crate::manifest::read_current_version;
use crate::pipeline::{SkipReason, Stage};
use crate::ui::Progress;
use semver::Version;
use std::path::PathBuf;

/// Inputs of a prepare run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareOptions {
    pub root: PathBuf,
    pub series: Series,
    pub ladder: Ladder,
    pub ignore_folders: Vec<String>,
    pub manifest_prefixes: Vec<String>,
    /// Read from the project manifest when `None`
    pub current_version: Option<String>,
}

impl PrepareOptions {
    /// Options from the `[prepare]` section, rooted at `root`
    pub fn from_config(config: &PrepareConfig, root: PathBuf) -> Result<Self> {
        Ok(PrepareOptions {
            root,
            series: config.series.parse()?,
            ladder: config.version_ladder.parse()?,
            ignore_folders: config.ignore_folders.clone(),
            manifest_prefixes: config.manifest_prefixes.clone(),
            current_version: None,
        })
    }
}

/// What a prepare run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareOutcome {
    pub current_version: String,
    pub next_version: Version,
    /// Number of files that were scanned
    pub scanned: usize,
    pub replacement: Stage<ReplacementReport>,
}

/// Bump the version across the project tree.
///
/// Per-file write failures do not stop the run; they are listed in the
/// returned report.
pub fn run_prepare(options: &PrepareOptions, progress: &Progress) -> Result<PrepareOutcome> {
    progress.heading("Preparing the next version");

    let current_version = match &options.current_version {
        Some(version) => version.trim().to_string(),
        None => read_current_version(&options.root)?,
    };
    progress.done(&format!("Current version is: {}", current_version));

    let next_version = compute_next_version(&current_version, &options.series, &options.ladder)?;
    progress.done(&format!("Next version will be: {}", next_version));

    progress.step("Scanning files to be modified");
    let targets = FileSetResolver::new()
        .with_ignore_folders(options.ignore_folders.clone())
        .with_manifest_prefixes(options.manifest_prefixes.clone())
        .resolve(&options.root)?;
    progress.done(&format!("Files to be scanned: {}", targets.len()));

    let replacement = if targets.is_empty() {
        let reason = SkipReason::NoTargetFiles;
        progress.skipped(&reason.to_string());
        Stage::Skipped(reason)
    } else {
        let replacer = TextReplacer::new(&current_version, &next_version.to_string())?;
        let report = replacer.replace_all(&targets);

        progress.done(&format!(
            "Bumped version in {} files",
            report.changed.len()
        ));
        for failure in &report.failed {
            progress.skipped(&format!(
                "Could not bump {}: {}",
                failure.path.display(),
                failure.reason
            ));
        }
        Stage::Ran(report)
    };

    Ok(PrepareOutcome {
        current_version,
        next_version,
        scanned: targets.len(),
        replacement,
    })
}
