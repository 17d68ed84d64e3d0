use crate::error::{AnnounceError, Result};
use crate::git::{CommitLog, RawCommit};
use chrono::{DateTime, FixedOffset};
use git2::{
    BranchType, Commit, Cred, CredentialType, ErrorCode, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository as Git2Repo, Signature, Sort, StashFlags, StatusOptions,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Root of the working tree, `None` for bare repositories
    pub fn workdir(&self) -> Option<PathBuf> {
        self.repo.workdir().map(Path::to_path_buf)
    }

    fn resolve_commit(&self, reference: &str) -> Result<Commit<'_>> {
        Ok(self.repo.revparse_single(reference)?.peel_to_commit()?)
    }

    fn signature(&self) -> Result<Signature<'static>> {
        Ok(self.repo.signature()?)
    }

    fn to_raw_commit(commit: &Commit<'_>) -> Result<RawCommit> {
        let author = commit.author();
        let when = author.when();
        let timestamp = commit_time(when.seconds(), when.offset_minutes()).ok_or_else(|| {
            AnnounceError::Git(git2::Error::from_str(&format!(
                "commit {} has an out-of-range timestamp",
                commit.id()
            )))
        })?;

        Ok(RawCommit {
            hash: commit.id().to_string(),
            author_name: author.name().unwrap_or("unknown").to_string(),
            author_email: author.email().unwrap_or_default().to_string(),
            timestamp,
            subject: commit.summary().unwrap_or_default().to_string(),
            body: commit.body().unwrap_or_default().trim().to_string(),
        })
    }
}

fn commit_time(seconds: i64, offset_minutes: i32) -> Option<DateTime<FixedOffset>> {
    let offset = FixedOffset::east_opt(offset_minutes * 60)?;
    DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&offset))
}

/// Credentials for remote operations: SSH keys from ~/.ssh, then the SSH
/// agent, then whatever the default credential helper provides.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        Cred::default()
    });

    callbacks.push_update_reference(|refname, status| match status {
        Some(message) => Err(git2::Error::from_str(&format!(
            "remote rejected {}: {}",
            refname, message
        ))),
        None => Ok(()),
    });

    callbacks
}

impl CommitLog for Git2Repository {
    fn commits_between(&self, from: Option<&str>, to: &str) -> Result<Vec<RawCommit>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;

        revwalk.push(self.resolve_commit(to)?.id())?;
        if let Some(from) = from {
            revwalk.hide(self.resolve_commit(from)?.id())?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let commit = self.repo.find_commit(oid_result?)?;
            commits.push(Self::to_raw_commit(&commit)?);
        }

        debug!(count = commits.len(), from = ?from, to, "read commit range");
        Ok(commits)
    }
}

impl super::Repository for Git2Repository {
    fn head_commit(&self) -> Result<String> {
        Ok(self.resolve_commit("HEAD")?.id().to_string())
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| AnnounceError::Git(git2::Error::from_str("HEAD is not a branch")))
    }

    fn latest_tag(&self) -> Result<Option<String>> {
        let names = self.repo.tag_names(None)?;
        let mut latest: Option<(i64, String)> = None;

        for name in names.iter().flatten() {
            let object = self.repo.revparse_single(&format!("refs/tags/{}", name))?;
            let tagged_at = object
                .as_tag()
                .and_then(|tag| tag.tagger())
                .map(|tagger| tagger.when().seconds())
                .or_else(|| {
                    object
                        .peel_to_commit()
                        .ok()
                        .map(|commit| commit.time().seconds())
                });

            let Some(tagged_at) = tagged_at else {
                continue;
            };

            let newer = match &latest {
                Some((seconds, current)) => {
                    tagged_at > *seconds || (tagged_at == *seconds && name > current.as_str())
                }
                None => true,
            };
            if newer {
                latest = Some((tagged_at, name.to_string()));
            }
        }

        Ok(latest.map(|(_, name)| name))
    }

    fn tag_commit(&self, tag_name: &str) -> Result<Option<String>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => Ok(Some(reference.peel_to_commit()?.id().to_string())),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remote_url(&self, remote: &str) -> Result<String> {
        let remote = self.repo.find_remote(remote)?;
        remote
            .url()
            .or_else(|| remote.pushurl())
            .map(str::to_string)
            .ok_or_else(|| {
                AnnounceError::Git(git2::Error::from_str(&format!(
                    "remote '{}' has no URL",
                    remote.name().unwrap_or_default()
                )))
            })
    }

    fn is_dirty(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        Ok(!self.repo.statuses(Some(&mut options))?.is_empty())
    }

    fn is_ahead_of(&self, remote: &str, branch: &str) -> Result<bool> {
        let local = self
            .repo
            .find_branch(branch, BranchType::Local)?
            .get()
            .peel_to_commit()?
            .id();

        let tracking = match self
            .repo
            .find_branch(&format!("{}/{}", remote, branch), BranchType::Remote)
        {
            Ok(tracking) => tracking.get().peel_to_commit()?.id(),
            Err(e) if e.code() == ErrorCode::NotFound => return Ok(true),
            Err(e) => return Err(e.into()),
        };

        let (ahead, _behind) = self.repo.graph_ahead_behind(local, tracking)?;
        Ok(ahead > 0)
    }

    fn commit_all(&mut self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.signature()?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid: Oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        debug!(commit = %oid, "committed working tree");
        Ok(oid.to_string())
    }

    fn stash_push(&mut self) -> Result<()> {
        let signature = self.signature()?;
        self.repo.stash_save(
            &signature,
            "announce: stashed before release",
            Some(StashFlags::INCLUDE_UNTRACKED),
        )?;
        Ok(())
    }

    fn stash_pop(&mut self) -> Result<()> {
        self.repo.stash_pop(0, None)?;
        Ok(())
    }

    fn create_annotated_tag(&mut self, name: &str, message: &str, target: &str) -> Result<()> {
        let object = self.repo.revparse_single(target)?.peel_to_commit()?;
        let signature = self.signature()?;

        self.repo
            .tag(name, object.as_object(), &signature, message, true)?;

        debug!(tag = name, target, "created annotated tag");
        Ok(())
    }

    fn push(&mut self, remote: &str, branch: &str, tags: &[String]) -> Result<()> {
        let mut remote = self.repo.find_remote(remote)?;

        let mut refspecs = vec![format!("refs/heads/{0}:refs/heads/{0}", branch)];
        refspecs.extend(tags.iter().map(|tag| format!("+refs/tags/{0}:refs/tags/{0}", tag)));

        let mut options = PushOptions::new();
        options.remote_callbacks(remote_callbacks());

        remote.push(&refspecs, Some(&mut options))?;

        debug!(remote = remote.name().unwrap_or_default(), branch, tags = tags.len(), "pushed");
        Ok(())
    }
}
