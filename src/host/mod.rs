//! Hosting platform access (GitHub, GitLab)
//!
//! The release flow talks to the platform through two narrow traits:
//! [ProfileLookup] for turning commit authors into profile links, and
//! [HostingApi] for reading and creating releases. [GitHost] picks the
//! implementation from the repository's host kind.

pub mod github;
pub mod gitlab;

pub use github::GitHubHost;
pub use gitlab::GitLabHost;

use crate::domain::{HostKind, RepositoryIdentity};
use crate::error::{AnnounceError, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

const USER_AGENT: &str = concat!("announce/", env!("CARGO_PKG_VERSION"));

/// Public profile links of a commit author
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorProfile {
    pub profile: Option<String>,
    pub avatar: Option<String>,
}

/// A release as the hosting platform reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub name: String,
    pub tag: String,
    /// RFC 3339 timestamp, `None` for drafts
    pub published_at: Option<String>,
    /// Source archive of the tagged tree
    pub tarball_url: Option<String>,
    pub prerelease: bool,
}

/// What to create on the hosting platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    pub tag: String,
    pub name: String,
    pub body: String,
    pub prerelease: bool,
}

/// Resolves a commit author to their platform profile
pub trait ProfileLookup {
    /// Look up the author of `commit_hash`, known locally by `email`.
    ///
    /// Returns `Ok(None)` when the platform has no account for the author.
    fn author_profile(
        &self,
        repo: &RepositoryIdentity,
        email: &str,
        commit_hash: &str,
    ) -> Result<Option<AuthorProfile>>;
}

/// Release operations on a hosting platform
pub trait HostingApi: ProfileLookup {
    /// Most recently published release
    fn latest_release(&self, repo: &RepositoryIdentity) -> Result<Option<ReleaseInfo>>;

    /// Release with the given display name
    fn find_release(&self, repo: &RepositoryIdentity, name: &str) -> Result<Option<ReleaseInfo>>;

    fn create_release(
        &self,
        repo: &RepositoryIdentity,
        request: &ReleaseRequest,
    ) -> Result<ReleaseInfo>;
}

/// Access tokens per platform
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostTokens {
    pub github: Option<String>,
    pub gitlab: Option<String>,
}

/// The supported hosting platforms
#[derive(Debug, Clone)]
pub enum GitHost {
    GitHub(GitHubHost),
    GitLab(GitLabHost),
}

impl GitHost {
    /// Build the client matching the repository's host kind
    pub fn for_repository(repo: &RepositoryIdentity, tokens: &HostTokens) -> Result<Self> {
        let host = match repo.kind {
            HostKind::GitHub => GitHost::GitHub(GitHubHost::new(
                github::api_base_for(&repo.domain),
                tokens.github.clone(),
            )?),
            HostKind::GitLab => GitHost::GitLab(GitLabHost::new(
                gitlab::api_base_for(&repo.domain),
                tokens.gitlab.clone(),
            )?),
        };
        Ok(host)
    }

    pub fn kind(&self) -> HostKind {
        match self {
            GitHost::GitHub(_) => HostKind::GitHub,
            GitHost::GitLab(_) => HostKind::GitLab,
        }
    }
}

impl ProfileLookup for GitHost {
    fn author_profile(
        &self,
        repo: &RepositoryIdentity,
        email: &str,
        commit_hash: &str,
    ) -> Result<Option<AuthorProfile>> {
        match self {
            GitHost::GitHub(host) => host.author_profile(repo, email, commit_hash),
            GitHost::GitLab(host) => host.author_profile(repo, email, commit_hash),
        }
    }
}

impl HostingApi for GitHost {
    fn latest_release(&self, repo: &RepositoryIdentity) -> Result<Option<ReleaseInfo>> {
        match self {
            GitHost::GitHub(host) => host.latest_release(repo),
            GitHost::GitLab(host) => host.latest_release(repo),
        }
    }

    fn find_release(&self, repo: &RepositoryIdentity, name: &str) -> Result<Option<ReleaseInfo>> {
        match self {
            GitHost::GitHub(host) => host.find_release(repo, name),
            GitHost::GitLab(host) => host.find_release(repo, name),
        }
    }

    fn create_release(
        &self,
        repo: &RepositoryIdentity,
        request: &ReleaseRequest,
    ) -> Result<ReleaseInfo> {
        match self {
            GitHost::GitHub(host) => host.create_release(repo, request),
            GitHost::GitLab(host) => host.create_release(repo, request),
        }
    }
}

fn http_client() -> Result<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

/// Send a request and decode the JSON body; 404 becomes `Ok(None)`.
fn send_json<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<Option<T>> {
    let response = request.send()?;
    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    Ok(Some(checked(response, what)?.json()?))
}

fn checked(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(AnnounceError::host(format!(
        "{} failed (HTTP {}): {}",
        what,
        status,
        body.trim()
    )))
}
