use crate::error::{AnnounceError, Result};
use crate::git::{CommitLog, RawCommit, Repository};
use std::collections::HashMap;

/// A push recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPush {
    pub remote: String,
    pub branch: String,
    pub tags: Vec<String>,
}

/// Mock repository for testing without actual git operations
///
/// Commits form a single linear history in insertion order; the last commit
/// added is HEAD. Mutating operations are recorded for assertions.
#[derive(Debug, Clone)]
pub struct MockRepository {
    commits: Vec<RawCommit>,
    tags: Vec<(String, String)>,
    remotes: HashMap<String, String>,
    branch: String,
    dirty: bool,
    ahead: bool,
    stash_depth: usize,
    pub created_tags: Vec<(String, String)>,
    pub commit_messages: Vec<String>,
    pub pushes: Vec<RecordedPush>,
    pub stash_events: Vec<&'static str>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: Vec::new(),
            remotes: HashMap::new(),
            branch: "main".to_string(),
            dirty: false,
            ahead: false,
            stash_depth: 0,
            created_tags: Vec::new(),
            commit_messages: Vec::new(),
            pushes: Vec::new(),
            stash_events: Vec::new(),
        }
    }

    /// Append a commit; it becomes HEAD
    pub fn add_commit(&mut self, commit: RawCommit) {
        self.commits.push(commit);
    }

    /// Add a tag pointing at a commit hash. Later tags count as newer.
    pub fn add_tag(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.tags.push((name.into(), hash.into()));
    }

    pub fn add_remote(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.remotes.insert(name.into(), url.into());
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn set_ahead(&mut self, ahead: bool) {
        self.ahead = ahead;
    }

    fn resolve(&self, reference: &str) -> Result<usize> {
        let hash = if reference == "HEAD" {
            self.commits.last().map(|c| c.hash.as_str())
        } else {
            self.tags
                .iter()
                .rev()
                .find(|(name, _)| name == reference)
                .map(|(_, hash)| hash.as_str())
                .or(Some(reference))
        };

        hash.and_then(|hash| self.commits.iter().position(|c| c.hash == hash))
            .ok_or_else(|| {
                AnnounceError::Git(git2::Error::from_str(&format!(
                    "revspec '{}' not found",
                    reference
                )))
            })
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitLog for MockRepository {
    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<RawCommit>> {
        let end = self.resolve(to)?;
        let start = match from {
            Some(from) => self.resolve(from)? + 1,
            None => 0,
        };

        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.commits[start..=end].to_vec())
    }
}

impl Repository for MockRepository {
    fn head_commit(&self) -> Result<String> {
        Ok(self.commits[self.resolve("HEAD")?].hash.clone())
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        Ok(self.tags.last().map(|(name, _)| name.clone()))
    }

    fn tag_commit(&self, tag_name: &str) -> Result<Option<String>> {
        Ok(self
            .tags
            .iter()
            .rev()
            .find(|(name, _)| name == tag_name)
            .map(|(_, hash)| hash.clone()))
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        self.remotes.get(remote).cloned().ok_or_else(|| {
            AnnounceError::Git(git2::Error::from_str(&format!(
                "remote '{}' does not exist",
                remote
            )))
        })
    }

    fn is_dirty(&self) -> Result<bool> {
        Ok(self.dirty)
    }

    fn is_ahead_of(&self, _remote: &str, _branch: &str) -> Result<bool> {
        Ok(self.ahead)
    }

    fn commit_all(&mut self, message: &str) -> Result<String> {
        let hash = format!("{:040x}", self.commits.len() + 1);
        let timestamp = match self.commits.last() {
            Some(last) => last.timestamp,
            None => chrono::DateTime::UNIX_EPOCH.fixed_offset(),
        };

        self.commits.push(RawCommit {
            hash: hash.clone(),
            author_name: "Mock".to_string(),
            author_email: "mock@example.com".to_string(),
            timestamp,
            subject: message.lines().next().unwrap_or_default().to_string(),
            body: String::new(),
        });
        self.commit_messages.push(message.to_string());
        self.dirty = false;
        self.ahead = true;
        Ok(hash)
    }

    fn stash_push(&mut self) -> Result<()> {
        self.stash_depth += 1;
        self.dirty = false;
        self.stash_events.push("push");
        Ok(())
    }

    fn stash_pop(&mut self) -> Result<()> {
        if self.stash_depth == 0 {
            return Err(AnnounceError::Git(git2::Error::from_str(
                "no stash entries to pop",
            )));
        }
        self.stash_depth -= 1;
        self.dirty = true;
        self.stash_events.push("pop");
        Ok(())
    }

    fn create_annotated_tag(&mut self, name: &str, message: &str, target: &str) -> Result<()> {
        let hash = self.commits[self.resolve(target)?].hash.clone();
        self.tags.retain(|(existing, _)| existing != name);
        self.tags.push((name.to_string(), hash));
        self.created_tags
            .push((name.to_string(), message.to_string()));
        Ok(())
    }

    fn push(&mut self, remote: &str, branch: &str, tags: &[String]) -> Result<()> {
        self.remote_url(remote)?;
        self.pushes.push(RecordedPush {
            remote: remote.to_string(),
            branch: branch.to_string(),
            tags: tags.to_vec(),
        });
        self.ahead = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(hash: &str, subject: &str) -> RawCommit {
        RawCommit {
            hash: hash.to_string(),
            author_name: "Test Author".to_string(),
            author_email: "author@example.com".to_string(),
            timestamp: chrono::DateTime::UNIX_EPOCH.fixed_offset(),
            subject: subject.to_string(),
            body: String::new(),
        }
    }

    fn repo_with_history() -> MockRepository {
        let mut repo = MockRepository::new();
        repo.add_commit(commit("a1", "feat: one"));
        repo.add_commit(commit("b2", "fix: two"));
        repo.add_commit(commit("c3", "docs: three"));
        repo
    }

    #[test]
    fn test_range_is_exclusive_of_from() {
        let mut repo = repo_with_history();
        repo.add_tag("V1.0.0", "a1");

        let commits = repo.commits_between(Some("V1.0.0"), "HEAD").unwrap();
        let hashes: Vec<_> = commits.iter().map(|c| c.hash.as_str()).collect();
        assert_eq!(hashes, vec!["b2", "c3"]);
    }

    #[test]
    fn test_full_history_without_from() {
        let repo = repo_with_history();
        assert_eq!(repo.commits_between(None, "b2").unwrap().len(), 2);
    }

    #[test]
    fn test_unknown_reference_fails() {
        let repo = repo_with_history();
        assert!(repo.commits_between(Some("nope"), "HEAD").is_err());
    }

    #[test]
    fn test_latest_tag_and_retagging() {
        let mut repo = repo_with_history();
        assert_eq!(repo.latest_tag().unwrap(), None);

        repo.add_tag("V1.0.0", "a1");
        repo.create_annotated_tag("V1.1.0", "msg", "HEAD").unwrap();
        assert_eq!(repo.latest_tag().unwrap(), Some("V1.1.0".to_string()));
        assert_eq!(repo.tag_commit("V1.1.0").unwrap(), Some("c3".to_string()));
    }

    #[test]
    fn test_stash_pop_without_push_fails() {
        let mut repo = MockRepository::new();
        assert!(repo.stash_pop().is_err());
    }

    #[test]
    fn test_push_requires_known_remote() {
        let mut repo = repo_with_history();
        assert!(repo.push("upstream", "main", &[]).is_err());

        repo.add_remote("upstream", "git@github.com:acme/widgets.git");
        repo.push("upstream", "main", &["V1.0.0".to_string()]).unwrap();
        assert_eq!(repo.pushes.len(), 1);
    }
}
