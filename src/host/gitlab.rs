use crate::domain::RepositoryIdentity;
use crate::error::Result;
use crate::host::{
    checked, github::newest_published, http_client, send_json, AuthorProfile, HostingApi,
    ProfileLookup, ReleaseInfo, ReleaseRequest,
};
use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded::byte_serialize;

pub fn api_base_for(domain: &str) -> String {
    format!("https://{}/api/v4", domain)
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    web_url: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    name: Option<String>,
    tag_name: String,
    released_at: Option<String>,
    #[serde(default)]
    upcoming_release: bool,
    #[serde(default)]
    assets: Option<AssetsResponse>,
}

#[derive(Debug, Deserialize)]
struct AssetsResponse {
    #[serde(default)]
    sources: Vec<SourceResponse>,
}

#[derive(Debug, Deserialize)]
struct SourceResponse {
    format: String,
    url: String,
}

impl From<ReleaseResponse> for ReleaseInfo {
    fn from(release: ReleaseResponse) -> Self {
        let tarball_url = release.assets.and_then(|assets| {
            assets
                .sources
                .into_iter()
                .find(|source| source.format == "tar.gz")
                .map(|source| source.url)
        });

        ReleaseInfo {
            name: release.name.unwrap_or_else(|| release.tag_name.clone()),
            tag: release.tag_name,
            published_at: release.released_at,
            tarball_url,
            prerelease: release.upcoming_release,
        }
    }
}

#[derive(Debug, Serialize)]
struct CreateReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    description: &'a str,
}

/// GitLab REST v4 client
///
/// GitLab has no prerelease flag; [ReleaseRequest::prerelease] is not sent.
#[derive(Debug, Clone)]
pub struct GitLabHost {
    client: Client,
    api_base: String,
    token: Option<String>,
}

impl GitLabHost {
    pub fn new(api_base: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(GitLabHost {
            client: http_client()?,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// Projects are addressed by their URL-encoded full path
    fn project_url(&self, repo: &RepositoryIdentity, path: &str) -> String {
        let id: String = byte_serialize(repo.full_name().as_bytes()).collect();
        format!("{}/projects/{}/{}", self.api_base, id, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header("PRIVATE-TOKEN", token),
            None => request,
        }
    }

    fn list_releases(&self, repo: &RepositoryIdentity) -> Result<Vec<ReleaseInfo>> {
        let url = self.project_url(repo, "releases?per_page=100");
        debug!(%url, "listing GitLab releases");

        let releases: Vec<ReleaseResponse> =
            send_json(self.authorized(self.client.get(&url)), "listing releases")?
                .unwrap_or_default();
        Ok(releases.into_iter().map(ReleaseInfo::from).collect())
    }
}

impl ProfileLookup for GitLabHost {
    fn author_profile(
        &self,
        _repo: &RepositoryIdentity,
        email: &str,
        _commit_hash: &str,
    ) -> Result<Option<AuthorProfile>> {
        let url = format!("{}/users", self.api_base);
        debug!(%url, email, "searching GitLab users");

        let request = self
            .authorized(self.client.get(&url))
            .query(&[("search", email)]);
        let users: Vec<UserResponse> = send_json(request, "searching users")?.unwrap_or_default();

        Ok(users.into_iter().next().map(|user| AuthorProfile {
            profile: user.web_url,
            avatar: user.avatar_url,
        }))
    }
}

impl HostingApi for GitLabHost {
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
        let url = self.project_url(repo, "releases");
        debug!(%url, tag = %request.tag, "creating GitLab release");

        let body = CreateReleaseBody {
            tag_name: &request.tag,
            name: &request.name,
            description: &request.body,
        };

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()?;
        let created: ReleaseResponse = checked(response, "creating release")?.json()?;
        Ok(created.into())
    }
}
