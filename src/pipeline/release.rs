//! `release`: changelog, tag, push and hosted release
//!
//! Order of work:
//! 1. a dirty working tree is committed (`commit`) or stashed
//! 2. tag stage: mine commits since the last tag, update the changelog,
//!    commit it and tag that commit
//! 3. push stage: push branch and tag when the branch is ahead of upstream
//! 4. release stage: mine commits since the last hosted release and create a
//!    release with rendered notes
//!
//! A stash taken in step 1 is popped again however the run ends.

use crate::config::ReleaseConfig;
use crate::domain::version::parse_current_version;
use crate::domain::{RepositoryIdentity, TagPattern};
use crate::error::{AnnounceError, Result};
use crate::files::write_atomically;
use crate::git::Repository;
use crate::history::{
    compose_changelog, compose_release_notes, mine_commit_range, resolve_contributor_profiles,
    MarkdownTemplate, UserTemplate, TemplateRenderer,
};
use crate::host::{HostingApi, ReleaseInfo, ReleaseRequest};
use crate::manifest::read_current_version;
use crate::pipeline::{upstream_identity, SkipReason, Stage};
use crate::ui::Progress;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Inputs of a release run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub root: PathBuf,
    pub commit: bool,
    /// Commit message for a dirty tree
    pub message: TagPattern,
    pub dont_tag: bool,
    /// Existing tag to release instead of tagging now
    pub tag: Option<String>,
    pub tag_name: TagPattern,
    pub tag_message: TagPattern,
    pub changelog_message: TagPattern,
    pub changelog_file: String,
    pub dont_release: bool,
    pub release_name: TagPattern,
    pub release_template: Option<PathBuf>,
    pub upstream: String,
}

impl ReleaseOptions {
    /// Options from the `[release]` section, rooted at `root`
    pub fn from_config(config: &ReleaseConfig, root: PathBuf) -> Self {
        ReleaseOptions {
            root,
            commit: config.commit,
            message: TagPattern::new(config.message.clone()),
            dont_tag: config.dont_tag,
            tag: config.tag.clone().filter(|t| !t.trim().is_empty()),
            tag_name: TagPattern::new(config.tag_name.clone()),
            tag_message: TagPattern::new(config.tag_message.clone()),
            changelog_message: TagPattern::new(config.changelog_message.clone()),
            changelog_file: config.changelog_file.clone(),
            dont_release: config.dont_release,
            release_name: TagPattern::new(config.release_name.clone()),
            release_template: config.release_message.clone(),
            upstream: config.upstream.clone(),
        }
    }
}

/// How a dirty working tree was dealt with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirtyTree {
    Clean,
    Committed { commit: String },
    Stashed,
}

/// The commit that got tagged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCommit {
    pub tag: String,
    pub commit: String,
    /// Entries written to the changelog
    pub entries: usize,
}

/// What a release run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub version: String,
    pub repository: RepositoryIdentity,
    pub dirty_tree: DirtyTree,
    pub tag: Stage<TaggedCommit>,
    pub push: Stage<String>,
    pub release: Stage<ReleaseInfo>,
}

/// Run the release flow against `repo` and the hosting platform `host`.
pub fn run_release<R, H>(
    options: &ReleaseOptions,
    repo: &mut R,
    host: &H,
    progress: &Progress,
) -> Result<ReleaseOutcome>
where
    R: Repository + ?Sized,
    H: HostingApi + ?Sized,
{
    progress.heading("Releasing");

    let version = read_current_version(&options.root)?;
    let repository = upstream_identity(&*repo, &options.upstream)?;
    progress.done(&format!("Releasing {} to {}", version, repository));

    let dirty_tree = settle_dirty_tree(options, repo, &version, progress)?;

    let result = run_stages(options, repo, host, &version, &repository, progress);

    if dirty_tree == DirtyTree::Stashed {
        progress.step("Restoring code - popping the stash");
        match (repo.stash_pop(), &result) {
            (Ok(()), _) => {}
            (Err(e), Ok(_)) => return Err(e),
            (Err(e), Err(_)) => warn!(error = %e, "could not pop the stash"),
        }
    }

    let (tag, push, release) = result?;
    Ok(ReleaseOutcome {
        version,
        repository,
        dirty_tree,
        tag,
        push,
        release,
    })
}

type StageResults = (Stage<TaggedCommit>, Stage<String>, Stage<ReleaseInfo>);

fn run_stages<R, H>(
    options: &ReleaseOptions,
    repo: &mut R,
    host: &H,
    version: &str,
    repository: &RepositoryIdentity,
    progress: &Progress,
) -> Result<StageResults>
where
    R: Repository + ?Sized,
    H: HostingApi + ?Sized,
{
    let tag = tag_stage(options, repo, version, repository, progress)?;

    let release_tag = match (&tag, &options.tag) {
        (Stage::Ran(tagged), _) => Some(tagged.tag.clone()),
        (_, Some(tag)) => Some(tag.clone()),
        _ => repo.latest_tag()?,
    };

    let push = push_stage(options, repo, release_tag.as_deref(), progress)?;
    let release = release_stage(options, repo, host, version, repository, release_tag, progress)?;

    Ok((tag, push, release))
}

fn settle_dirty_tree<R: Repository + ?Sized>(
    options: &ReleaseOptions,
    repo: &mut R,
    version: &str,
    progress: &Progress,
) -> Result<DirtyTree> {
    if !repo.is_dirty()? {
        progress.done("Branch clean. No requirement to commit or stash");
        return Ok(DirtyTree::Clean);
    }

    if options.commit {
        progress.step("Branch is dirty. Starting commit process");
        let message = if options.message.pattern.trim().is_empty() {
            TagPattern::new("chore: prepare release {version}").format(version)
        } else {
            options.message.format(version)
        };
        let commit = repo.commit_all(&message)?;
        progress.done(&format!("Committed working tree as {}", commit));
        return Ok(DirtyTree::Committed { commit });
    }

    progress.step("Branch is dirty. Starting stash process");
    repo.stash_push()?;
    progress.done("Stashed local changes");
    Ok(DirtyTree::Stashed)
}

fn tag_stage<R: Repository + ?Sized>(
    options: &ReleaseOptions,
    repo: &mut R,
    version: &str,
    repository: &RepositoryIdentity,
    progress: &Progress,
) -> Result<Stage<TaggedCommit>> {
    if let Some(tag) = &options.tag {
        let reason = SkipReason::TagSupplied { tag: tag.clone() };
        progress.skipped(&reason.to_string());
        return Ok(Stage::Skipped(reason));
    }
    if options.dont_tag {
        let reason = SkipReason::TaggingDisabled;
        progress.skipped(&reason.to_string());
        return Ok(Stage::Skipped(reason));
    }

    progress.step("Generating CHANGELOG");
    let last_tag = repo.latest_tag()?;
    let from = match &last_tag {
        Some(tag) => repo.tag_commit(tag)?,
        None => None,
    };
    debug!(last_tag = ?last_tag, from = ?from, "changelog range");

    let history = mine_commit_range(from.as_deref(), "HEAD", &*repo)?;

    let changelog_path = options.root.join(&options.changelog_file);
    let document = if changelog_path.exists() {
        fs::read_to_string(&changelog_path)?
    } else {
        String::new()
    };
    let updated = compose_changelog(&history.entries, repository, &document);
    write_atomically(&changelog_path, updated.as_bytes())?;
    progress.done(&format!(
        "Generated CHANGELOG with {} entries",
        history.entries.len()
    ));

    let commit = repo.commit_all(&options.changelog_message.format(version))?;
    progress.done("Committed CHANGELOG");

    let tag = options.tag_name.format(version);
    let message = options.tag_message.format(version);
    repo.create_annotated_tag(&tag, &message, &commit)?;
    progress.done(&format!("Tag {}: {} created", tag, message));

    Ok(Stage::Ran(TaggedCommit {
        tag,
        commit,
        entries: history.entries.len(),
    }))
}

fn push_stage<R: Repository + ?Sized>(
    options: &ReleaseOptions,
    repo: &mut R,
    release_tag: Option<&str>,
    progress: &Progress,
) -> Result<Stage<String>> {
    let branch = repo.current_branch()?;

    if !repo.is_ahead_of(&options.upstream, &branch)? {
        let reason = SkipReason::NothingToPush {
            remote: options.upstream.clone(),
            branch,
        };
        progress.skipped(&reason.to_string());
        return Ok(Stage::Skipped(reason));
    }

    let tags: Vec<String> = release_tag.map(str::to_string).into_iter().collect();
    repo.push(&options.upstream, &branch, &tags)?;
    progress.done(&format!(
        "Pushed commit and tag to {} remote",
        options.upstream
    ));

    Ok(Stage::Ran(branch))
}

fn release_stage<R, H>(
    options: &ReleaseOptions,
    repo: &mut R,
    host: &H,
    version: &str,
    repository: &RepositoryIdentity,
    release_tag: Option<String>,
    progress: &Progress,
) -> Result<Stage<ReleaseInfo>>
where
    R: Repository + ?Sized,
    H: HostingApi + ?Sized,
{
    if options.dont_release {
        let reason = SkipReason::ReleaseDisabled;
        progress.skipped(&reason.to_string());
        return Ok(Stage::Skipped(reason));
    }

    let release_tag = release_tag.ok_or_else(|| {
        AnnounceError::config("no tag to release; tag the code first or pass --tag")
    })?;
    let to = repo.tag_commit(&release_tag)?.ok_or_else(|| {
        AnnounceError::config(format!("tag '{}' does not exist", release_tag))
    })?;

    progress.step("Fetching last release information");
    let last_release = host.latest_release(repository)?;
    let from = match &last_release {
        Some(release) => repo.tag_commit(&release.tag)?,
        None => None,
    };
    debug!(
        last_release = ?last_release.as_ref().map(|r| r.tag.as_str()),
        from = ?from,
        to = %to,
        "release range"
    );

    progress.step("Generating release notes");
    let mut history = mine_commit_range(from.as_deref(), &to, &*repo)?;
    resolve_contributor_profiles(&mut history.contributors, repository, host)?;

    let renderer: Box<dyn TemplateRenderer> = match &options.release_template {
        Some(path) => Box::new(UserTemplate::from_file(&options.root.join(path))?),
        None => Box::new(MarkdownTemplate),
    };

    let parsed = parse_current_version(version)?;
    let name = options.release_name.format(version);
    let body = compose_release_notes(
        &history.entries,
        &history.contributors,
        &parsed,
        &name,
        repository,
        renderer.as_ref(),
    )?;

    progress.step(&format!("Creating the release on {}", repository.domain));
    let created = host.create_release(
        repository,
        &ReleaseRequest {
            tag: release_tag,
            name,
            body,
            prerelease: !parsed.pre.is_empty(),
        },
    )?;
    progress.done(&format!("Created release {}", created.name));

    Ok(Stage::Ran(created))
}
