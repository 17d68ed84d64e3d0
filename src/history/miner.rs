//! Mining typed change entries out of a commit range

use crate::domain::{CommitEntry, ContributorTable, ParsedChange, RepositoryIdentity};
use crate::error::Result;
use crate::git::{CommitLog, RawCommit};
use crate::host::ProfileLookup;
use tracing::{debug, info};

/// Entries and authors found in a commit range
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MinedHistory {
    /// Change entries in commit order, subject before body within a commit
    pub entries: Vec<CommitEntry>,
    pub contributors: ContributorTable,
}

impl MinedHistory {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extract every change entry a single commit announces.
///
/// The subject is tested first, then each body line, so one commit may yield
/// several entries.
pub fn entries_from_commit(commit: &RawCommit) -> Vec<CommitEntry> {
    std::iter::once(commit.subject.as_str())
        .chain(commit.body.lines())
        .filter_map(ParsedChange::parse)
        .map(|change| CommitEntry {
            hash: commit.hash.clone(),
            author_name: commit.author_name.clone(),
            author_email: commit.author_email.clone(),
            timestamp: commit.timestamp,
            kind: change.kind,
            component: change.component,
            message: change.message,
            is_breaking_change: change.is_breaking_change,
        })
        .collect()
}

/// Mine `(from, to]` for conventional-commit entries.
///
/// `from = None` mines back to the root commit. Only commits that produced at
/// least one entry contribute an author.
pub fn mine_commit_range<L: CommitLog + ?Sized>(
    from: Option<&str>,
    to: &str,
    log: &L,
) -> Result<MinedHistory> {
    let commits = log.commits_between(from, to)?;
    let mut history = MinedHistory::default();

    for commit in &commits {
        let entries = entries_from_commit(commit);
        if entries.is_empty() {
            continue;
        }

        history
            .contributors
            .record(&commit.author_name, &commit.author_email, &commit.hash);
        history.entries.extend(entries);
    }

    info!(
        commits = commits.len(),
        entries = history.entries.len(),
        authors = history.contributors.len(),
        "mined commit range"
    );
    Ok(history)
}

/// Look up a profile for every contributor, once per unique email.
///
/// Contributors without an email are skipped. Lookup errors propagate.
pub fn resolve_contributor_profiles<P: ProfileLookup + ?Sized>(
    table: &mut ContributorTable,
    repo: &RepositoryIdentity,
    lookup: &P,
) -> Result<()> {
    let pending: Vec<(String, String)> = table
        .with_first_commits()
        .filter(|(contributor, _)| !contributor.email.is_empty())
        .map(|(contributor, hash)| (contributor.email.clone(), hash.to_string()))
        .collect();

    for (email, hash) in pending {
        let profile = lookup.author_profile(repo, &email, &hash)?;
        debug!(email = %email, found = profile.is_some(), "resolved author profile");

        if let Some(profile) = profile {
            table.set_profile(&email, profile.profile, profile.avatar);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChangeKind, HostKind};
    use crate::git::MockRepository;
    use crate::host::AuthorProfile;
    use chrono::DateTime;
    use std::cell::RefCell;

    fn raw(hash: &str, email: &str, subject: &str, body: &str) -> RawCommit {
        RawCommit {
            hash: hash.to_string(),
            author_name: email.split('@').next().unwrap_or_default().to_string(),
            author_email: email.to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-03-05T10:00:00+01:00").unwrap(),
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }

    struct CountingLookup {
        calls: RefCell<Vec<String>>,
    }

    impl ProfileLookup for CountingLookup {
        fn author_profile(
            &self,
            _repo: &RepositoryIdentity,
            email: &str,
            _commit_hash: &str,
        ) -> Result<Option<AuthorProfile>> {
            self.calls.borrow_mut().push(email.to_string());
            Ok(Some(AuthorProfile {
                profile: Some(format!("https://github.com/{}", email)),
                avatar: None,
            }))
        }
    }

    #[test]
    fn test_subject_then_body_entries() {
        let commit = raw(
            "abc1234def",
            "ada@example.com",
            "feat(core): add ladder",
            "Some context\r\nfix: off by one\ndocs(readme): mention ladder\nchore: unrelated",
        );

        let entries = entries_from_commit(&commit);
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ChangeKind::Feature, ChangeKind::Fix, ChangeKind::Doc]
        );
        assert_eq!(entries[0].component.as_deref(), Some("core"));
        assert_eq!(entries[1].message, "off by one");
        assert_eq!(entries[2].component.as_deref(), Some("readme"));
    }

    #[test]
    fn test_mine_preserves_commit_order() {
        let mut repo = MockRepository::new();
        repo.add_commit(raw("a1", "ada@example.com", "feat: one", ""));
        repo.add_commit(raw("b2", "bob@example.com", "chore: skip", ""));
        repo.add_commit(raw("c3", "bob@example.com", "fix: two", ""));
        repo.add_commit(raw("d4", "ada@example.com", "docs: three", ""));

        let history = mine_commit_range(None, "HEAD", &repo).unwrap();
        let messages: Vec<_> = history.entries.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["one", "two", "three"]);
        assert_eq!(history.contributors.len(), 2);
    }

    #[test]
    fn test_empty_range_is_not_an_error() {
        let mut repo = MockRepository::new();
        repo.add_commit(raw("a1", "ada@example.com", "feat: one", ""));
        repo.add_tag("V1.0.0", "a1");

        let history = mine_commit_range(Some("V1.0.0"), "HEAD", &repo).unwrap();
        assert!(history.is_empty());
        assert!(history.contributors.is_empty());
    }

    #[test]
    fn test_one_lookup_per_unique_email() {
        let mut repo = MockRepository::new();
        for (i, email) in ["ada@example.com", "bob@example.com", "ada@example.com"]
            .iter()
            .enumerate()
        {
            repo.add_commit(raw(
                &format!("h{}", i),
                email,
                "feat: thing",
                "fix: other thing",
            ));
        }

        let mut history = mine_commit_range(None, "HEAD", &repo).unwrap();
        assert_eq!(history.entries.len(), 6);

        let lookup = CountingLookup {
            calls: RefCell::new(Vec::new()),
        };
        let identity = RepositoryIdentity::new(HostKind::GitHub, "github.com", "acme", "widgets");
        resolve_contributor_profiles(&mut history.contributors, &identity, &lookup).unwrap();

        assert_eq!(
            *lookup.calls.borrow(),
            vec!["ada@example.com".to_string(), "bob@example.com".to_string()]
        );
        assert_eq!(
            history
                .contributors
                .get("bob@example.com")
                .and_then(|c| c.profile.as_deref()),
            Some("https://github.com/bob@example.com")
        );
    }
}
