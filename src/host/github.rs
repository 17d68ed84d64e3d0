use crate::domain::RepositoryIdentity;
use crate::error::Result;
use crate::host::{
    checked, http_client, send_json, AuthorProfile, HostingApi, ProfileLookup, ReleaseInfo,
    ReleaseRequest,
};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// REST endpoint for a GitHub domain; anything but github.com is treated as
/// GitHub Enterprise.
pub fn api_base_for(domain: &str) -> String {
    if domain == "github.com" {
        "https://api.github.com".to_string()
    } else {
        format!("https://{}/api/v3", domain)
    }
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    author: Option<AccountResponse>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    html_url: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    name: Option<String>,
    tag_name: String,
    published_at: Option<String>,
    tarball_url: Option<String>,
    #[serde(default)]
    prerelease: bool,
}

impl From<ReleaseResponse> for ReleaseInfo {
    fn from(release: ReleaseResponse) -> Self {
        ReleaseInfo {
            name: release.name.unwrap_or_else(|| release.tag_name.clone()),
            tag: release.tag_name,
            published_at: release.published_at,
            tarball_url: release.tarball_url,
            prerelease: release.prerelease,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    prerelease: bool,
}

/// GitHub REST v3 client
#[derive(Debug, Clone)]
pub struct GitHubHost {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubHost {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(GitHubHost {
            client: http_client()?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    fn repo_url(&self, repo: &RepositoryIdentity, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, repo.owner, repo.project, path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    fn list_releases(&self, repo: &RepositoryIdentity) -> Result<Vec<ReleaseInfo>> {
        let url = self.repo_url(repo, "releases?per_page=100");
        debug!(%url, "listing GitHub releases");

        let releases: Vec<ReleaseResponse> =
            send_json(self.authorized(self.client.get(&url)), "listing releases")?
                .unwrap_or_default();
        Ok(releases.into_iter().map(ReleaseInfo::from).collect())
    }
}

/// Pick the release with the newest publication time; drafts never win.
pub(crate) fn newest_published(releases: Vec<ReleaseInfo>) -> Option<ReleaseInfo> {
    releases
        .into_iter()
        .filter(|release| release.published_at.is_some())
        .max_by(|left, right| {
            let parse = |r: &ReleaseInfo| {
                r.published_at
                    .as_deref()
                    .and_then(|at| chrono::DateTime::parse_from_rfc3339(at).ok())
            };
            parse(left).cmp(&parse(right))
        })
}

impl ProfileLookup for GitHubHost {
    fn author_profile(
        &self,
        repo: &RepositoryIdentity,
        _email: &str,
        commit_hash: &str,
    ) -> Result<Option<AuthorProfile>> {
        let url = self.repo_url(repo, &format!("commits/{}", commit_hash));
        debug!(%url, "fetching commit author");

        let commit: Option<CommitResponse> =
            send_json(self.authorized(self.client.get(&url)), "fetching commit")?;

        Ok(commit.and_then(|c| c.author).map(|author| AuthorProfile {
            profile: author.html_url,
            avatar: author.avatar_url,
        }))
    }
}

impl HostingApi for GitHubHost {
    fn latest_release(&self, repo: &RepositoryIdentity) -> Result<Option<ReleaseInfo>> {
        Ok(newest_published(self.list_releases(repo)?))
    }

    fn find_release(&self, repo: &RepositoryIdentity, name: &str) -> Result<Option<ReleaseInfo>> {
        Ok(self
            .list_releases(repo)?
            .into_iter()
            .find(|release| release.name == name))
    }

    fn create_release(
        &self,
        repo: &RepositoryIdentity,
        request: &ReleaseRequest,
    ) -> Result<ReleaseInfo> {
        let url = self.repo_url(repo, "releases");
        debug!(%url, tag = %request.tag, "creating GitHub release");

        let body = CreateReleaseBody {
            tag_name: &request.tag,
            name: &request.name,
            body: &request.body,
            prerelease: request.prerelease,
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()?;
        let created: ReleaseResponse = checked(response, "creating release")?.json()?;
        Ok(created.into())
    }
}
