//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the git operations the
//! release flow needs, with a real implementation backed by `git2` and a mock
//! implementation for tests.
//!
//! # Overview
//!
//! - [CommitLog]: the narrow log-retrieval capability the history miner
//!   consumes.
//! - [Repository]: everything the release flow does to a working copy
//!   (tagging, committing, stashing, pushing).
//!
//! Implementations:
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for testing
//!
//! # Usage
//!
//! ```rust
//! # use announce::git::CommitLog;
//! # fn example<L: CommitLog>(log: &L) -> Result<(), Box<dyn std::error::Error>> {
//! let commits = log.commits_between(Some("V1.0.0"), "HEAD")?;
//! for commit in commits {
//!     println!("{} {}", commit.hash, commit.subject);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use chrono::{DateTime, FixedOffset};

/// One commit as returned by the log provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommit {
    /// Full commit hash
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    /// Author time, in the author's own UTC offset
    pub timestamp: DateTime<FixedOffset>,
    /// First line of the message
    pub subject: String,
    /// Message without the subject line
    pub body: String,
}

/// Read access to commit history
pub trait CommitLog {
    /// Get commits reachable from `to` but not from `from`
    ///
    /// `from` is exclusive and `to` inclusive; `None` for `from` walks back to
    /// the root commit. References may be anything git can resolve to a commit
    /// (hash, tag, branch, `HEAD`).
    ///
    /// # Returns
    /// * `Ok(Vec<RawCommit>)` - Commits in chronological order (oldest first)
    /// * `Err` - If either reference cannot be resolved
    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<RawCommit>>;
}

/// Working-copy operations used by the release flow
///
/// Methods that change the repository or a remote take `&mut self`.
pub trait Repository: CommitLog {
    /// Full hash of the commit at HEAD
    fn head_commit(&self) -> Result<String>;

    /// Short name of the checked-out branch
    fn current_branch(&self) -> Result<String>;

    /// Most recently created tag, if any
    ///
    /// Annotated tags are dated by their tagger, lightweight tags by the
    /// commit they point at.
    fn latest_tag(&self) -> Result<Option<String>>;

    /// Hash of the commit a tag points at, or `None` if the tag doesn't exist
    fn tag_commit(&self, tag_name: &str) -> Result<Option<String>>;

    /// Fetch URL (or push URL when no fetch URL is set) of a remote
    fn remote_url(&self, remote: &str) -> Result<String>;

    /// Whether the working tree has modified, staged or untracked files
    fn is_dirty(&self) -> Result<bool>;

    /// Whether the local branch has commits its remote-tracking branch lacks
    ///
    /// A branch without a remote-tracking counterpart counts as ahead.
    fn is_ahead_of(&self, remote: &str, branch: &str) -> Result<bool>;

    /// Stage everything and commit; returns the new commit hash
    fn commit_all(&mut self, message: &str) -> Result<String>;

    /// Stash local changes, including untracked files
    fn stash_push(&mut self) -> Result<()>;

    /// Restore the most recent stash
    fn stash_pop(&mut self) -> Result<()>;

    /// Create (or replace) an annotated tag at `target`
    fn create_annotated_tag(&mut self, name: &str, message: &str, target: &str) -> Result<()>;

    /// Push a branch and the given tags to a remote
    fn push(&mut self, remote: &str, branch: &str, tags: &[String]) -> Result<()>;
}
