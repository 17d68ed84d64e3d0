//! Identity of the hosted repository a release is cut for

use crate::error::{AnnounceError, Result};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Which hosting platform a repository lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    GitHub,
    GitLab,
}

impl HostKind {
    fn from_domain(domain: &str) -> Option<Self> {
        if domain.contains("github") {
            Some(HostKind::GitHub)
        } else if domain.contains("gitlab") {
            Some(HostKind::GitLab)
        } else {
            None
        }
    }
}

/// Owner/project coordinates of a hosted repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryIdentity {
    pub kind: HostKind,
    pub domain: String,
    pub owner: String,
    pub project: String,
}

impl RepositoryIdentity {
    pub fn new(
        kind: HostKind,
        domain: impl Into<String>,
        owner: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        RepositoryIdentity {
            kind,
            domain: domain.into(),
            owner: owner.into(),
            project: project.into(),
        }
    }

    /// Parse a git remote URL.
    ///
    /// Accepts scp-like (`git@github.com:owner/repo.git`), `https://` and
    /// `ssh://` forms. GitLab subgroups end up in `owner` (`group/sub`).
    pub fn from_remote_url(remote: &str) -> Result<Self> {
        let remote = remote.trim();
        let (domain, path) = split_remote(remote)
            .ok_or_else(|| AnnounceError::UnsupportedHost(remote.to_string()))?;

        let kind = HostKind::from_domain(&domain)
            .ok_or_else(|| AnnounceError::UnsupportedHost(domain.clone()))?;

        let path = path.trim_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let (owner, project) = path
            .rsplit_once('/')
            .filter(|(owner, project)| !owner.is_empty() && !project.is_empty())
            .ok_or_else(|| AnnounceError::UnsupportedHost(remote.to_string()))?;

        Ok(RepositoryIdentity::new(kind, domain, owner, project))
    }

    /// `owner/project`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.project)
    }

    /// Browser URL of the repository
    pub fn web_url(&self) -> String {
        format!("https://{}/{}/{}", self.domain, self.owner, self.project)
    }

    /// Browser URL of a single commit
    pub fn commit_url(&self, hash: &str) -> String {
        match self.kind {
            HostKind::GitHub => format!("{}/commit/{}", self.web_url(), hash),
            HostKind::GitLab => format!("{}/-/commit/{}", self.web_url(), hash),
        }
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.domain, self.owner, self.project)
    }
}

fn split_remote(remote: &str) -> Option<(String, String)> {
    if remote.contains("://") {
        let url = Url::parse(remote).ok()?;
        let domain = url.host_str()?.to_string();
        return Some((domain, url.path().to_string()));
    }

    // scp-like syntax: [user@]host:path
    let (host, path) = remote.split_once(':')?;
    let domain = host.rsplit('@').next()?.to_string();
    if domain.is_empty() {
        return None;
    }
    Some((domain, path.to_string()))
}
